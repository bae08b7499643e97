pub mod alert;
pub mod quote;
pub mod report;
