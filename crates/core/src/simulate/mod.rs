pub mod alert;
pub mod quote;

pub use alert::simulated_alerts;
pub use quote::simulated_quote;
