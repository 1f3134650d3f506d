//! Date parsing for `--since`
//!
//! Accepts ISO 8601 dates, unix timestamps (`@1700000000`) and past relative
//! forms such as "yesterday" or "2 weeks ago".

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Parse a date string into a SystemTime
pub fn parse_date(date_str: &str) -> Result<SystemTime, String> {
    let trimmed = date_str.trim();
    parse_iso_date(trimmed)
        .or_else(|| parse_timestamp(trimmed))
        .or_else(|| parse_relative_date(trimmed, Utc::now()))
        .ok_or_else(|| {
            format!(
                "Invalid date format: '{}'. Expected ISO 8601 (YYYY-MM-DD), a unix timestamp (@SECONDS) or a relative date (e.g. 'yesterday', '2 weeks ago')",
                date_str
            )
        })
}

fn parse_iso_date(date_str: &str) -> Option<SystemTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc).into());
    }
    if let Ok(dt) = date_str.parse::<DateTime<Utc>>() {
        return Some(dt.into());
    }
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().into())
}

fn parse_timestamp(date_str: &str) -> Option<SystemTime> {
    let seconds = date_str.strip_prefix('@')?.parse::<u64>().ok()?;
    Some(UNIX_EPOCH + std::time::Duration::from_secs(seconds))
}

/// "now", "today", "yesterday", "N <unit> ago" and "N<unit> ago"
fn parse_relative_date(date_str: &str, now: DateTime<Utc>) -> Option<SystemTime> {
    let lower = date_str.to_lowercase();
    match lower.as_str() {
        "now" | "today" => return Some(now.into()),
        "yesterday" => return Some((now - Duration::days(1)).into()),
        _ => {}
    }

    let parts: Vec<&str> = lower.split_whitespace().collect();
    let (count, unit) = match parts.as_slice() {
        [count, unit, "ago"] => (count.parse::<i64>().ok()?, *unit),
        [combined, "ago"] => {
            let idx = combined.find(|c: char| c.is_alphabetic())?;
            (combined[..idx].parse::<i64>().ok()?, &combined[idx..])
        }
        _ => return None,
    };
    Some((now - time_unit(unit, count)?).into())
}

fn time_unit(unit: &str, count: i64) -> Option<Duration> {
    match unit {
        "second" | "seconds" | "sec" | "secs" | "s" => Some(Duration::seconds(count)),
        "minute" | "minutes" | "min" | "mins" | "m" => Some(Duration::minutes(count)),
        "hour" | "hours" | "hr" | "hrs" | "h" => Some(Duration::hours(count)),
        "day" | "days" | "d" => Some(Duration::days(count)),
        "week" | "weeks" | "w" => Some(Duration::weeks(count)),
        "month" | "months" => Some(Duration::days(count * 30)), // approximate
        "year" | "years" | "y" => Some(Duration::days(count * 365)), // approximate
        _ => None,
    }
}
