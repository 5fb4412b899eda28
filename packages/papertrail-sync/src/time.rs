//! Date handling for event windows.
//!
//! All dates use a single pattern, `MM/DD/YYYY hh:mm:ss`, interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::ValidationError;

pub const DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Parse a date in [`DATE_FORMAT`] to Unix seconds.
pub fn parse_date(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().timestamp())
}

/// Format Unix seconds back in [`DATE_FORMAT`] (UTC).
pub fn format_unix(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .format(DATE_FORMAT)
        .to_string()
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Inclusive retrieval window in Unix seconds. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: i64,
    end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateBoundaries);
        }
        Ok(Self { start, end })
    }

    /// Build a window from two dates in [`DATE_FORMAT`].
    pub fn parse(start_date: &str, end_date: &str) -> Result<Self, ValidationError> {
        let start = parse_date(start_date).ok_or_else(|| ValidationError::InvalidDate {
            field: "startdate",
            value: start_date.to_string(),
        })?;
        let end = parse_date(end_date).ok_or_else(|| ValidationError::InvalidDate {
            field: "enddate",
            value: end_date.to_string(),
        })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_are_inverse() {
        let ts = parse_date("03/01/2021 10:00:00").unwrap();
        assert_eq!(ts, 1_614_592_800);
        assert_eq!(format_unix(ts), "03/01/2021 10:00:00");
    }

    #[test]
    fn test_parse_rejects_other_layouts() {
        assert!(parse_date("2021-03-01 10:00:00").is_none());
        assert!(parse_date("13/01/2021 10:00:00").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_window_rejects_inverted_bounds() {
        let err = TimeWindow::parse("03/02/2021 00:00:00", "03/01/2021 00:00:00").unwrap_err();
        assert_eq!(err, ValidationError::InvalidDateBoundaries);
    }

    #[test]
    fn test_window_accepts_equal_bounds() {
        let window = TimeWindow::parse("03/01/2021 00:00:00", "03/01/2021 00:00:00").unwrap();
        assert_eq!(window.start(), window.end());
    }

    #[test]
    fn test_window_reports_bad_field() {
        let err = TimeWindow::parse("03/01/2021 00:00:00", "tomorrow").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate { field: "enddate", .. }));
    }
}
