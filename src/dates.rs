//! Date normalization for spreadsheet-sourced work orders.
//!
//! Work-order dates arrive as native date cells, spreadsheet serial numbers,
//! or text in one of several layouts. [`normalize`] turns all of them into a
//! `NaiveDateTime`, or `None` when the value is blank or unreadable.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::CellValue;

/// Text layouts tried in order; the first that parses wins.
///
/// `03/04/2024` therefore reads as March 4th (month/day) before the
/// day/month layout is ever tried.
pub const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%Y-%d-%m",
];

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Day 0 of the spreadsheet serial calendar.
///
/// 1899-12-30 rather than 1900-01-01 absorbs the phantom 1900-02-29, so
/// serials from 1900-03-01 onwards land on the dates spreadsheets display.
#[must_use]
pub fn serial_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Normalize any cell into a date/time.
#[must_use]
pub fn normalize(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::Empty => None,
        CellValue::Date(d) => Some(*d),
        #[allow(clippy::cast_precision_loss)]
        CellValue::Integer(days) => from_serial(*days as f64),
        CellValue::Float(days) => from_serial(*days),
        CellValue::Text(text) => parse_text(text),
    }
}

/// Convert a spreadsheet serial number (fractional days allowed).
#[must_use]
pub fn from_serial(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let millis = (days * MILLIS_PER_DAY).round();
    #[allow(clippy::cast_possible_truncation)]
    let offset = Duration::try_milliseconds(millis as i64)?;
    serial_epoch().checked_add_signed(offset)
}

/// Serial number of `date` in the 1900 calendar; inverse of [`from_serial`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_serial(date: NaiveDateTime) -> f64 {
    (date - serial_epoch()).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Parse text against [`DATE_FORMATS`].
#[must_use]
pub fn parse_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Whole days from `start` to `end`, rounded towards negative infinity.
#[must_use]
pub fn days_between(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_seconds().div_euclid(86_400)
}

/// `YYYY-MM` bucket
#[must_use]
pub fn month_bucket(date: NaiveDateTime) -> String {
    date.format("%Y-%m").to_string()
}

/// `YYYY-Qn` bucket
#[must_use]
pub fn quarter_bucket(date: NaiveDateTime) -> String {
    let quarter = (date.month() - 1) / 3 + 1;
    format!("{}-Q{quarter}", date.year())
}

/// `YYYY` bucket
#[must_use]
pub fn year_bucket(date: NaiveDateTime) -> String {
    date.year().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .expect("valid date")
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_serial_epoch_anchors() {
        assert_eq!(normalize(&CellValue::Integer(0)), Some(ymd(1899, 12, 30)));
        assert_eq!(normalize(&CellValue::Integer(1)), Some(ymd(1899, 12, 31)));
        assert_eq!(normalize(&CellValue::Integer(60)), Some(ymd(1900, 2, 28)));
        assert_eq!(normalize(&CellValue::Float(45_301.0)), Some(ymd(2024, 1, 10)));
    }

    #[test]
    fn test_fractional_serial_keeps_time() {
        let noon = normalize(&CellValue::Float(45_301.5)).expect("serial");
        assert_eq!(noon, ymd(2024, 1, 10) + Duration::hours(12));
    }

    #[test]
    fn test_non_finite_serial_is_absent() {
        assert_eq!(from_serial(f64::NAN), None);
        assert_eq!(from_serial(f64::INFINITY), None);
        assert_eq!(from_serial(1e300), None);
    }

    #[test]
    fn test_text_formats_in_order() {
        assert_eq!(parse_text("2024-01-10"), Some(ymd(2024, 1, 10)));
        // month/day wins over day/month for ambiguous input
        assert_eq!(parse_text("03/04/2024"), Some(ymd(2024, 3, 4)));
        // only valid as day/month
        assert_eq!(parse_text("25/04/2024"), Some(ymd(2024, 4, 25)));
        assert_eq!(parse_text("2024/04/25"), Some(ymd(2024, 4, 25)));
        assert_eq!(parse_text("25-04-2024"), Some(ymd(2024, 4, 25)));
        // only valid as year-day-month
        assert_eq!(parse_text("2024-25-04"), Some(ymd(2024, 4, 25)));
    }

    #[test]
    fn test_unparseable_is_absent() {
        assert_eq!(normalize(&CellValue::Empty), None);
        assert_eq!(normalize(&CellValue::Text(String::new())), None);
        assert_eq!(parse_text("yesterday"), None);
        assert_eq!(parse_text("2024-01-10 08:00:00"), None);
    }

    #[test]
    fn test_native_dates_pass_through() {
        let d = ymd(2023, 7, 1) + Duration::minutes(90);
        assert_eq!(normalize(&CellValue::Date(d)), Some(d));
    }

    #[test]
    fn test_days_between_floors() {
        let start = ymd(2024, 1, 10);
        assert_eq!(days_between(start, ymd(2024, 1, 15)), 5);
        assert_eq!(days_between(start, ymd(2024, 1, 8)), -2);
        assert_eq!(days_between(start, start - Duration::hours(12)), -1);
        assert_eq!(days_between(start, start + Duration::hours(36)), 1);
    }

    #[test]
    fn test_buckets() {
        let d = ymd(2024, 11, 3);
        assert_eq!(month_bucket(d), "2024-11");
        assert_eq!(quarter_bucket(d), "2024-Q4");
        assert_eq!(quarter_bucket(ymd(2024, 3, 31)), "2024-Q1");
        assert_eq!(quarter_bucket(ymd(2024, 4, 1)), "2024-Q2");
        assert_eq!(year_bucket(d), "2024");
    }
}
