use chrono::{DateTime, Utc};

// ============== Relative Time ==============

/// Human-relative rendering of `then` as seen from `now` ("5 minutes ago", "in 2 hours").
///
/// Buckets follow the usual moment-style thresholds (45s, 45m, 22h, 26d, ...).
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then);
    let past = diff.num_seconds() >= 0;
    let secs = diff.num_seconds().abs();

    let mins = (secs as f64 / 60.0).round() as i64;
    let hours = (secs as f64 / 3600.0).round() as i64;
    let days = (secs as f64 / 86_400.0).round() as i64;

    let phrase = if secs < 45 {
        "a few seconds".to_string()
    } else if secs < 90 {
        "a minute".to_string()
    } else if mins < 45 {
        format!("{mins} minutes")
    } else if mins < 90 {
        "an hour".to_string()
    } else if hours < 22 {
        format!("{hours} hours")
    } else if hours < 36 {
        "a day".to_string()
    } else if days < 26 {
        format!("{days} days")
    } else if days < 45 {
        "a month".to_string()
    } else if days < 320 {
        format!("{} months", (days as f64 / 30.4).round() as i64)
    } else if days < 548 {
        "a year".to_string()
    } else {
        format!("{} years", (days as f64 / 365.25).round() as i64)
    };

    if past {
        format!("{phrase} ago")
    } else {
        format!("in {phrase}")
    }
}
