//! Lightweight cron expression parser.
//! Supports: "MIN HOUR DOM MON DOW" (5-field, no seconds)
//! Wildcards: *, */N, N, comma lists. Minute, hour, and day-of-week are
//! honored; day-of-month and month accept only `*` semantics.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike};

/// Compute the next fire time strictly after `after`, in `after`'s offset.
pub fn next_run(expression: &str, after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let parts: Vec<&str> = expression.split_whitespace().collect();
    if parts.len() != 5 {
        tracing::warn!(
            "Invalid cron expression: '{}' (need 5 fields: MIN HOUR DOM MON DOW)",
            expression
        );
        return None;
    }

    let minutes = parse_field(parts[0], 0, 59)?;
    let hours = parse_field(parts[1], 0, 23)?;
    // Day-of-month and month are only supported as '*'.
    let days_of_week = parse_field(parts[4], 0, 6)?;

    let mut candidate = (after + Duration::minutes(1))
        .with_second(0)
        .and_then(|c| c.with_nanosecond(0))
        .unwrap_or(after);

    // Scan a bit over a week so any day-of-week constraint is reachable.
    for _ in 0..(8 * 24 * 60) {
        let dow = candidate.weekday().num_days_from_sunday();
        if minutes.contains(&candidate.minute())
            && hours.contains(&candidate.hour())
            && days_of_week.contains(&dow)
        {
            return Some(candidate);
        }
        candidate += Duration::minutes(1);
    }

    None
}

/// Parse a cron field into a list of matching values.
fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    if field == "*" {
        return Some((min..=max).collect());
    }

    // */N — every N
    if let Some(step) = field.strip_prefix("*/") {
        let n: u32 = step.parse().ok()?;
        if n == 0 {
            return None;
        }
        return Some((min..=max).step_by(n as usize).collect());
    }

    // Comma-separated: "0,15,30,45"
    if field.contains(',') {
        let vals: Result<Vec<u32>, _> = field.split(',').map(|s| s.trim().parse()).collect();
        return vals
            .ok()
            .map(|v| v.into_iter().filter(|x| *x >= min && *x <= max).collect());
    }

    // Single number
    let n: u32 = field.parse().ok()?;
    if n >= min && n <= max {
        Some(vec![n])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            // 2026-01-12 is a Monday
            .with_ymd_and_hms(2026, 1, 12, h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_daily_time_before_and_after() {
        let next = next_run("0 9 * * *", at(7, 0)).unwrap();
        assert_eq!((next.hour(), next.minute()), (9, 0));
        assert_eq!(next.day(), 12);

        let next = next_run("0 9 * * *", at(10, 0)).unwrap();
        assert_eq!((next.hour(), next.minute()), (9, 0));
        assert_eq!(next.day(), 13);
    }

    #[test]
    fn test_strictly_after() {
        // A tick exactly at the fire time schedules the next day, not now.
        let next = next_run("30 14 * * *", at(14, 30)).unwrap();
        assert_eq!(next.day(), 13);
    }

    #[test]
    fn test_every_15_minutes() {
        let next = next_run("*/15 * * * *", at(10, 2)).unwrap();
        assert_eq!(next.minute(), 15);
    }

    #[test]
    fn test_comma_list() {
        let next = next_run("0,30 * * * *", at(10, 10)).unwrap();
        assert_eq!(next.minute(), 30);
    }

    #[test]
    fn test_day_of_week() {
        // Wednesday = 3; asked on Monday morning.
        let next = next_run("0 8 * * 3", at(7, 0)).unwrap();
        assert_eq!(next.day(), 14);
        assert_eq!(next.hour(), 8);
    }

    #[test]
    fn test_invalid_expression() {
        assert!(next_run("bad", at(7, 0)).is_none());
        assert!(next_run("61 9 * * *", at(7, 0)).is_none());
        assert!(next_run("*/0 * * * *", at(7, 0)).is_none());
    }
}
