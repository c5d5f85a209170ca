//! Turning `--days` / `--start-date` / `--end-date` into a concrete range.

use std::fmt;

use chrono::{Days, NaiveDate};
use stargazer_core::model::DATE_FORMAT;

use crate::error::{IngestError, IngestResult};

/// An inclusive `[start, end]` range of calendar dates with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of calendar days covered, counting both ends.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> IngestResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        IngestError::InvalidRange(format!("invalid date '{value}', expected YYYY-MM-DD"))
    })
}

/// Resolve the range an ingestion run will query.
///
/// - `start` and `end`: used as given.
/// - only `start`: `end = start + (days - 1)`.
/// - only `end`: `start = end - (days - 1)`.
/// - neither: the `days` days ending `today`.
///
/// `end` is then clamped to `today`. Fails with
/// [`IngestError::InvalidRange`] when `days <= 0` or when the resolved
/// `start` is after `end`.
pub fn resolve_date_range(
    days: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> IngestResult<DateRange> {
    if days <= 0 {
        return Err(IngestError::InvalidRange(format!(
            "--days must be positive, got {days}"
        )));
    }
    let span = u64::try_from(days - 1)
        .map(Days::new)
        .map_err(|_| IngestError::InvalidRange(format!("--days out of range: {days}")))?;
    let overflow = || IngestError::InvalidRange(format!("{days} days is outside the calendar"));

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, start.checked_add_days(span).ok_or_else(overflow)?),
        (None, Some(end)) => (end.checked_sub_days(span).ok_or_else(overflow)?, end),
        (None, None) => (today.checked_sub_days(span).ok_or_else(overflow)?, today),
    };

    let end = end.min(today);
    if start > end {
        return Err(IngestError::InvalidRange(format!(
            "start date {} must be on or before end date {}",
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT)
        )));
    }

    Ok(DateRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 3, 15)
    }

    #[test]
    fn test_start_only_extends_by_days() {
        let start = date(2024, 1, 1);
        let range = resolve_date_range(30, Some(start), None, today()).unwrap();
        assert_eq!(range.start, start);
        assert_eq!(range.end, date(2024, 1, 30));
        assert_eq!(range.len_days(), 30);
    }

    #[test]
    fn test_end_only_reaches_back_by_days() {
        let range = resolve_date_range(7, None, Some(date(2024, 2, 10)), today()).unwrap();
        assert_eq!(range.start, date(2024, 2, 4));
        assert_eq!(range.end, date(2024, 2, 10));
    }

    #[test]
    fn test_neither_ends_today() {
        let range = resolve_date_range(30, None, None, today()).unwrap();
        assert_eq!(range.end, today());
        assert_eq!(range.start, date(2024, 2, 15));
    }

    #[test]
    fn test_both_given_ignores_days() {
        let range =
            resolve_date_range(1, Some(date(2024, 1, 1)), Some(date(2024, 1, 10)), today())
                .unwrap();
        assert_eq!(range.len_days(), 10);
    }

    #[test]
    fn test_single_day() {
        let range = resolve_date_range(1, None, None, today()).unwrap();
        assert_eq!(range.start, range.end);
        assert_eq!(range.len_days(), 1);
    }

    #[test]
    fn test_end_is_clamped_to_today() {
        let range = resolve_date_range(30, Some(date(2024, 3, 1)), None, today()).unwrap();
        assert_eq!(range.start, date(2024, 3, 1));
        assert_eq!(range.end, today());

        let range =
            resolve_date_range(5, None, Some(date(2025, 1, 1)), today()).unwrap();
        assert_eq!(range.end, today());
    }

    #[test]
    fn test_start_in_future_is_invalid() {
        let result = resolve_date_range(5, Some(date(2024, 4, 1)), None, today());
        assert!(matches!(result, Err(IngestError::InvalidRange(_))));
    }

    #[test]
    fn test_reversed_range_is_invalid_regardless_of_days() {
        for days in [1, 5, 30, 365] {
            let result = resolve_date_range(
                days,
                Some(date(2024, 1, 5)),
                Some(date(2024, 1, 1)),
                today(),
            );
            assert!(matches!(result, Err(IngestError::InvalidRange(_))));
        }
    }

    #[test]
    fn test_non_positive_days_is_invalid() {
        assert!(matches!(
            resolve_date_range(0, None, None, today()),
            Err(IngestError::InvalidRange(_))
        ));
        assert!(matches!(
            resolve_date_range(-3, Some(date(2024, 1, 1)), None, today()),
            Err(IngestError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_huge_days_does_not_panic() {
        let result = resolve_date_range(i64::MAX, None, None, today());
        assert!(matches!(result, Err(IngestError::InvalidRange(_))));
    }

    #[test]
    fn test_never_after_today_and_ordered() {
        let starts = [None, Some(date(2023, 12, 1)), Some(date(2024, 3, 10))];
        let ends = [None, Some(date(2024, 3, 12)), Some(date(2024, 6, 1))];
        for days in [1, 2, 10, 31, 400] {
            for start in starts {
                for end in ends {
                    if let Ok(range) = resolve_date_range(days, start, end, today()) {
                        assert!(range.end <= today());
                        assert!(range.start <= range.end);
                    }
                }
            }
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-01").unwrap(), date(2024, 2, 1));
        assert!(matches!(
            parse_date("2024-13-01"),
            Err(IngestError::InvalidRange(_))
        ));
        assert!(matches!(
            parse_date("02/01/2024"),
            Err(IngestError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_display() {
        let range = DateRange {
            start: date(2024, 1, 1),
            end: date(2024, 1, 31),
        };
        assert_eq!(range.to_string(), "2024-01-01 to 2024-01-31");
        assert_eq!(range.len_days(), 31);
    }
}
