//! Best-effort parsing of chapter release dates.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Absolute date layouts seen on chapter lists.
const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%d/%m/%Y", "%Y-%m-%d", "%d %B %Y"];

static RELATIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\s*(second|sec|minute|min|hour|day|week|month|year)s?\s+ago$").unwrap()
});

/// Parses release-date text relative to `now`.
///
/// Understands a handful of absolute layouts, RFC 3339 timestamps and
/// "N units ago". Returns `None` for anything else so the caller can fall
/// back to the extraction time.
pub fn parse_release_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match text.to_lowercase().as_str() {
        "just now" | "today" => return Some(now),
        "yesterday" => return now.checked_sub_signed(TimeDelta::try_days(1)?),
        _ => {}
    }

    if let Some(caps) = RELATIVE_DATE.captures(text) {
        let amount: i64 = caps[1].parse().ok()?;
        let delta = match caps[2].to_lowercase().as_str() {
            "second" | "sec" => TimeDelta::try_seconds(amount),
            "minute" | "min" => TimeDelta::try_minutes(amount),
            "hour" => TimeDelta::try_hours(amount),
            "day" => TimeDelta::try_days(amount),
            "week" => TimeDelta::try_weeks(amount),
            "month" => amount.checked_mul(30).and_then(TimeDelta::try_days),
            "year" => amount.checked_mul(365).and_then(TimeDelta::try_days),
            _ => None,
        }?;
        return now.checked_sub_signed(delta);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
