use chrono::{DateTime, Utc};

/// Format how long ago `time` was, as seen from `now`.
/// Anything a week or older is shown as a plain date.
pub fn format_time_ago(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(time);
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        time.format("%Y-%m-%d").to_string()
    }
}
