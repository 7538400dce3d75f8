//! Time helpers
//!
//! Date-string to millis conversion happens at the API handler layer;
//! repositories only ever see `i64` Unix millis. Export formatting uses
//! the pt-BR reading order the report consumers expect.

use chrono::{DateTime, NaiveDate, Utc};

use super::{AppError, AppResult};

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Start of day (00:00:00 UTC) as Unix millis
pub fn day_start_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// End of day as the next day's 00:00:00 Unix millis; callers use the
/// exclusive `< end` form.
pub fn day_end_millis(date: NaiveDate) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day)
}

fn datetime_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}

/// Format millis as dd/mm/YYYY
pub fn format_date_br(millis: i64) -> String {
    datetime_from_millis(millis).format("%d/%m/%Y").to_string()
}

/// Format millis as HH:MM:SS
pub fn format_time_br(millis: i64) -> String {
    datetime_from_millis(millis).format("%H:%M:%S").to_string()
}

/// Format millis as an RFC 3339 / ISO-8601 timestamp
pub fn format_iso(millis: i64) -> String {
    datetime_from_millis(millis).to_rfc3339()
}

/// Date stamp (YYYY-MM-DD) for export file names
pub fn file_date_stamp(millis: i64) -> String {
    datetime_from_millis(millis).format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_bounds_a_day() {
        let date = parse_date("2026-03-05").unwrap();
        let start = day_start_millis(date);
        let end = day_end_millis(date);
        assert_eq!(end - start, 24 * 60 * 60 * 1000);
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_date("05/03/2026").is_err());
    }

    #[test]
    fn formats_brazilian_reading_order() {
        // 2026-03-05T14:30:00Z
        let millis = 1_772_721_000_000;
        assert_eq!(format_date_br(millis), "05/03/2026");
        assert_eq!(format_time_br(millis), "14:30:00");
        assert_eq!(file_date_stamp(millis), "2026-03-05");
    }
}
