pub mod ago;

pub use ago::format_time_ago;
