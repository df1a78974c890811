//! Date helpers in the deployment timezone.
//!
//! Everything user-facing works in local (fixed-offset) time; storage is UTC.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::{Result, StudoptError};

/// Vietnamese weekday names, indexed Sunday = 0.
const DAY_NAMES: [&str; 7] = [
    "Chủ Nhật",
    "Thứ Hai",
    "Thứ Ba",
    "Thứ Tư",
    "Thứ Năm",
    "Thứ Sáu",
    "Thứ Bảy",
];

/// Weekday name for a 0..=6 index (Sunday = 0).
pub fn day_of_week_text(day: u8) -> &'static str {
    DAY_NAMES.get(day as usize).copied().unwrap_or("?")
}

/// Today's day-of-week in the given timezone, Sunday = 0.
pub fn current_day_of_week(tz: FixedOffset) -> u8 {
    Utc::now().with_timezone(&tz).weekday().num_days_from_sunday() as u8
}

/// dd/MM/yyyy in the given timezone.
pub fn format_date(dt: DateTime<Utc>, tz: FixedOffset) -> String {
    dt.with_timezone(&tz).format("%d/%m/%Y").to_string()
}

/// dd/MM/yyyy HH:MM in the given timezone.
pub fn format_date_time(dt: DateTime<Utc>, tz: FixedOffset) -> String {
    dt.with_timezone(&tz).format("%d/%m/%Y %H:%M").to_string()
}

/// Parse "YYYY-MM-DD HH:MM" as local time in `tz`, returning UTC.
pub fn parse_local(s: &str, tz: FixedOffset) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M")
        .map_err(|e| StudoptError::Parse(format!("invalid date '{s}': {e}")))?;
    match tz.from_local_datetime(&naive).single() {
        Some(local) => Ok(local.with_timezone(&Utc)),
        None => Err(StudoptError::Parse(format!("ambiguous local time '{s}'"))),
    }
}

/// Parse "HH:MM" into (hour, minute).
pub fn parse_hhmm(s: &str) -> Result<(u32, u32)> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| StudoptError::Parse(format!("invalid time '{s}'")))?;
    let hour: u32 = h
        .trim()
        .parse()
        .map_err(|_| StudoptError::Parse(format!("invalid hour in '{s}'")))?;
    let minute: u32 = m
        .trim()
        .parse()
        .map_err(|_| StudoptError::Parse(format!("invalid minute in '{s}'")))?;
    if hour > 23 || minute > 59 {
        return Err(StudoptError::Parse(format!("time out of range '{s}'")));
    }
    Ok((hour, minute))
}

/// Next occurrence of a weekly class slot at or after `now`.
///
/// `day_of_week` is Sunday = 0; `start_time` is "HH:MM" local. If the slot
/// already passed this week, the same slot next week is returned.
pub fn next_class_occurrence(
    now: DateTime<FixedOffset>,
    day_of_week: u8,
    start_time: &str,
) -> Result<DateTime<FixedOffset>> {
    let (hour, minute) = parse_hhmm(start_time)?;
    let today = now.weekday().num_days_from_sunday() as i64;
    let days_ahead = (day_of_week as i64 - today).rem_euclid(7);

    let slot = now
        .with_hour(hour)
        .and_then(|d| d.with_minute(minute))
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .ok_or_else(|| StudoptError::Parse(format!("invalid time '{start_time}'")))?
        + Duration::days(days_ahead);

    if slot <= now {
        Ok(slot + Duration::days(7))
    } else {
        Ok(slot)
    }
}

/// True when both instants fall on the same calendar day in `tz`.
pub fn is_same_day(a: DateTime<Utc>, b: DateTime<Utc>, tz: FixedOffset) -> bool {
    a.with_timezone(&tz).date_naive() == b.with_timezone(&tz).date_naive()
}
