//! Timestamp rendering for chat transcripts.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampStyle {
    /// `14:05`
    #[default]
    Time,
    /// `2024-01-20`
    Date,
    /// `2024-01-20 14:05:09`
    DateTime,
    /// `3 minutes ago`
    Relative,
}

impl FromStr for TimestampStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time" => Ok(TimestampStyle::Time),
            "date" => Ok(TimestampStyle::Date),
            "datetime" => Ok(TimestampStyle::DateTime),
            "relative" => Ok(TimestampStyle::Relative),
            _ => Err(format!("Invalid timestamp style: {}", s)),
        }
    }
}

/// Render `ts` in the local time zone.
pub fn format_timestamp(ts: DateTime<Utc>, style: TimestampStyle) -> String {
    let local = ts.with_timezone(&Local);
    match style {
        TimestampStyle::Time => local.format("%H:%M").to_string(),
        TimestampStyle::Date => local.format("%Y-%m-%d").to_string(),
        TimestampStyle::DateTime => local.format("%Y-%m-%d %H:%M:%S").to_string(),
        TimestampStyle::Relative => relative_time(ts, Utc::now()),
    }
}

/// Parse an RFC 3339 string, an ISO 8601 time without offset (read as UTC),
/// or a Unix timestamp in milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// Describe how long before `now` the timestamp `ts` was.
///
/// Timestamps in the future read as "just now".
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - ts).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "just now".to_string()
    } else if minutes == 1 {
        "1 minute ago".to_string()
    } else if minutes < 60 {
        format!("{} minutes ago", minutes)
    } else if hours == 1 {
        "1 hour ago".to_string()
    } else if hours < 24 {
        format!("{} hours ago", hours)
    } else if days == 1 {
        "1 day ago".to_string()
    } else {
        format!("{} days ago", days)
    }
}
