use chrono::{DateTime, Utc};

/// Relative label for alert timestamps: "Just now", "5 mins ago", "1 hour ago", "2 days ago".
/// Units are floored; timestamps in the future read as "Just now".
pub fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(timestamp).num_seconds();
    if secs < 60 {
        return "Just now".to_string();
    }

    let minutes = secs / 60;
    if minutes < 60 {
        return plural(minutes, "min");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }

    plural(hours / 24, "day")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
