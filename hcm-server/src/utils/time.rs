//! Time helpers - business timezone conversion
//!
//! Calendar dates travel as `YYYY-MM-DD` strings and instants as Unix
//! millis; every conversion between the two goes through the configured
//! business timezone.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;

use super::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Date + time of day → Unix millis (business timezone)
///
/// DST gap fallback: a local time that does not exist is read as UTC.
pub fn date_time_to_millis(date: NaiveDate, time: NaiveTime, tz: Tz) -> i64 {
    let naive = date.and_time(time);
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Start of day (00:00) → Unix millis (business timezone)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_time_to_millis(date, NaiveTime::MIN, tz)
}

/// End of day → next day's 00:00 in Unix millis; callers compare with `<`
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    date_time_to_millis(next_day, NaiveTime::MIN, tz)
}

/// Parse `HH:MM` on a given date → Unix millis (business timezone)
pub fn parse_time_on_date(date: NaiveDate, time: &str, tz: Tz) -> AppResult<i64> {
    let t = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|_| AppError::validation(format!("Invalid time format (HH:MM): {}", time)))?;
    Ok(date_time_to_millis(date, t, tz))
}

/// Unix millis → local date-time in the business timezone
pub fn millis_to_local(millis: i64, tz: Tz) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&tz))
}

/// Business date of an instant
pub fn millis_to_date(millis: i64, tz: Tz) -> Option<NaiveDate> {
    millis_to_local(millis, tz).map(|dt| dt.date_naive())
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let d = parse_date("2025-03-14").unwrap();
        assert_eq!(format_date(d), "2025-03-14");
        assert!(parse_date("14/03/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn test_day_bounds_in_timezone() {
        let tz = chrono_tz::Asia::Kolkata;
        let d = parse_date("2025-01-01").unwrap();
        let start = day_start_millis(d, tz);
        let end = day_end_millis(d, tz);
        assert_eq!(end - start, 24 * 60 * 60 * 1000);
        // Midnight IST is 18:30 UTC the previous day
        assert_eq!(start, 1_735_669_800_000);
        assert_eq!(millis_to_date(start, tz), Some(d));
        assert_eq!(millis_to_date(end - 1, tz), Some(d));
    }

    #[test]
    fn test_parse_time_on_date() {
        let tz = chrono_tz::UTC;
        let d = parse_date("2025-01-01").unwrap();
        let millis = parse_time_on_date(d, "09:30", tz).unwrap();
        assert_eq!(millis - day_start_millis(d, tz), (9 * 60 + 30) * 60 * 1000);
        assert!(parse_time_on_date(d, "9h30", tz).is_err());
    }

    #[test]
    fn test_weekend() {
        assert!(is_weekend(parse_date("2025-03-15").unwrap())); // Saturday
        assert!(!is_weekend(parse_date("2025-03-17").unwrap())); // Monday
    }
}
