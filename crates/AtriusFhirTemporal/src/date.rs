use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use chrono::{Datelike, NaiveDate};
use tracing::debug;
use crate::clock::{HostClock, SystemClock};
use crate::error::{TemporalError, TemporalResult};
use crate::parser::{ParseMode, TemporalParser};

pub(crate) const YEAR_RANGE: RangeInclusive<i32> = 0..=9999;
pub(crate) const MONTH_RANGE: RangeInclusive<u32> = 1..=12;
pub(crate) const DAY_RANGE: RangeInclusive<u32> = 1..=31;

/// Precision levels for FHIR Date values.
///
/// FHIR dates support partial precision, allowing year-only, year-month,
/// or full date specifications. This enum tracks which components are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatePrecision {
    /// Year only (YYYY)
    Year,
    /// Year and month (YYYY-MM)
    YearMonth,
    /// Full date (YYYY-MM-DD)
    Full,
}

/// A FHIR calendar date with partial precision.
///
/// The year is always present; month and day are optional. A day is only
/// ever held together with a month. Out-of-range components are dropped
/// instead of clamped, so a value never claims more precision than its
/// source had.
///
/// Day validity against the month's length is not checked: `2015-02-31`
/// is a valid `CalendarDate`, it just has no chrono counterpart.
///
/// # FHIR Date Formats
/// - `YYYY` - Year only
/// - `YYYY-MM` - Year and month
/// - `YYYY-MM-DD` - Full date
///
/// # Examples
/// ```rust
/// use atrius_fhir_temporal::{CalendarDate, DatePrecision};
///
/// let date = CalendarDate::parse("2015-03-54").unwrap();
/// assert_eq!(date.precision(), DatePrecision::YearMonth);
/// assert_eq!(date.to_string(), "2015-03");
///
/// // A month of 13 discards both month and day
/// let date = CalendarDate::new(2015, Some(13), Some(2));
/// assert_eq!(date.to_string(), "2015");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarDate {
    /// Year component (always present)
    year: i32,
    /// Month component (1-12)
    month: Option<u32>,
    /// Day component (1-31), only set when `month` is
    day: Option<u32>,
}

impl CalendarDate {
    /// Creates a date, dropping an out-of-range month or day.
    ///
    /// A dropped month also drops the day. The year is clamped to
    /// `0..=9999`, the four-digit years FHIR text can carry.
    pub fn new(year: i32, month: Option<u32>, day: Option<u32>) -> Self {
        let mut date = Self {
            year: 0,
            month: None,
            day: None,
        };
        date.set_year(year);
        date.set_month(month);
        date.set_day(day);
        date
    }

    /// Creates a year-only precision date.
    pub fn from_year(year: i32) -> Self {
        Self::new(year, None, None)
    }

    /// Creates a year-month precision date.
    pub fn from_year_month(year: i32, month: u32) -> Self {
        Self::new(year, Some(month), None)
    }

    /// Creates a full precision date.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Self {
        Self::new(year, Some(month), Some(day))
    }

    /// Returns today's date according to the system clock.
    pub fn today() -> Self {
        Self::today_with(&SystemClock)
    }

    /// Returns today's date in the local offset of `clock`.
    pub fn today_with<C: HostClock + ?Sized>(clock: &C) -> Self {
        let now = clock.now();
        Self::from_ymd(now.year(), now.month(), now.day())
    }

    /// Parses a FHIR date string.
    ///
    /// An invalid month or day lowers the precision instead of failing, and
    /// anything after the date is ignored. Fails only when no year can be read.
    pub fn parse(s: &str) -> TemporalResult<Self> {
        let parsed = TemporalParser::new(s, ParseMode::Date).parse()?;
        parsed
            .date
            .ok_or_else(|| TemporalError::InvalidYear(s.to_string()))
    }

    /// Returns the precision level of this date.
    pub fn precision(&self) -> DatePrecision {
        match (self.month, self.day) {
            (None, _) => DatePrecision::Year,
            (Some(_), None) => DatePrecision::YearMonth,
            (Some(_), Some(_)) => DatePrecision::Full,
        }
    }

    /// Returns the year component.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Returns the month component if present.
    pub fn month(&self) -> Option<u32> {
        self.month
    }

    /// Returns the day component if present.
    pub fn day(&self) -> Option<u32> {
        self.day
    }

    /// Sets the year, clamped to `0..=9999`.
    pub fn set_year(&mut self, year: i32) {
        self.year = year.clamp(*YEAR_RANGE.start(), *YEAR_RANGE.end());
        if self.year != year {
            debug!("Clamping year {} to {}", year, self.year);
        }
    }

    /// Sets the month; a value outside 1-12 (or `None`) clears month and day.
    pub fn set_month(&mut self, month: Option<u32>) {
        self.month = month.filter(|m| MONTH_RANGE.contains(m));
        if self.month.is_none() {
            if let Some(m) = month {
                debug!("Dropping out-of-range month {} of year {}", m, self.year);
            }
            self.day = None;
        }
    }

    /// Sets the day; a value outside 1-31, or any day without a month, is dropped.
    pub fn set_day(&mut self, day: Option<u32>) {
        self.day = self.month.and(day).filter(|d| DAY_RANGE.contains(d));
        if let (None, Some(d)) = (self.day, day) {
            debug!("Dropping day {} of {}", d, self);
        }
    }

    /// Converts to a NaiveDate, using 1 for missing month and day.
    ///
    /// Fails for days past the end of their month.
    pub fn to_naive_date(&self) -> TemporalResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
            .ok_or_else(|| TemporalError::NotRepresentable(self.to_string()))
    }
}

impl Default for CalendarDate {
    fn default() -> Self {
        // Default to epoch date 1970-01-01
        Self::from_ymd(1970, 1, 1)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_ymd(date.year(), date.month(), date.day())
    }
}

impl FromStr for CalendarDate {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{:02}", month)?;
            if let Some(day) = self.day {
                write!(f, "-{:02}", day)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::DateTime;

    #[test]
    fn test_parse_partial_precision() {
        let year = CalendarDate::parse("2015").unwrap();
        assert_eq!(year.precision(), DatePrecision::Year);
        assert_eq!((year.year(), year.month(), year.day()), (2015, None, None));

        let year_month = CalendarDate::parse("2015-03").unwrap();
        assert_eq!(year_month.precision(), DatePrecision::YearMonth);
        assert_eq!(year_month.month(), Some(3));

        let full = CalendarDate::parse("2015-03-28").unwrap();
        assert_eq!(full, CalendarDate::from_ymd(2015, 3, 28));
    }

    #[test]
    fn test_invalid_components_truncate() {
        assert_eq!(CalendarDate::parse("2015-83").unwrap(), CalendarDate::from_year(2015));
        assert_eq!(
            CalendarDate::parse("2015-03-54").unwrap(),
            CalendarDate::from_year_month(2015, 3)
        );
        assert_eq!(CalendarDate::parse("2015-00").unwrap(), CalendarDate::from_year(2015));
    }

    #[test]
    fn test_year_overflow_is_hard_failure() {
        assert_eq!(
            CalendarDate::parse("201512"),
            Err(TemporalError::InvalidYear("201512".to_string()))
        );
        assert!(CalendarDate::parse("abcd").is_err());
        assert_eq!(CalendarDate::parse(""), Err(TemporalError::Empty));
    }

    #[test]
    fn test_constructor_drops_out_of_range_fields() {
        let date = CalendarDate::new(2015, Some(13), Some(2));
        assert_eq!(date.month(), None);
        assert_eq!(date.day(), None);

        let date = CalendarDate::new(2015, Some(2), Some(32));
        assert_eq!(date.month(), Some(2));
        assert_eq!(date.day(), None);

        // Day validity against month length is not enforced
        let date = CalendarDate::from_ymd(2015, 2, 31);
        assert_eq!(date.to_string(), "2015-02-31");
        assert!(date.to_naive_date().is_err());
    }

    #[test]
    fn test_mutation_revalidates_single_field() {
        let mut date = CalendarDate::from_ymd(2015, 3, 28);
        date.set_day(Some(40));
        assert_eq!(date.to_string(), "2015-03");
        date.set_day(Some(4));
        assert_eq!(date.to_string(), "2015-03-04");
        date.set_month(Some(0));
        assert_eq!(date.to_string(), "2015");
        date.set_day(Some(4));
        assert_eq!(date.day(), None);
    }

    #[test]
    fn test_format_pads_components() {
        assert_eq!(CalendarDate::from_year(815).to_string(), "0815");
        assert_eq!(CalendarDate::from_year_month(2015, 3).to_string(), "2015-03");
        assert_eq!(CalendarDate::from_ymd(2015, 3, 8).to_string(), "2015-03-08");
    }

    #[test]
    fn test_round_trip_through_format() {
        for s in ["2015", "2015-03", "2015-03-28", "0001-01-01"] {
            let parsed = CalendarDate::parse(s).unwrap();
            assert_eq!(CalendarDate::parse(&parsed.to_string()).unwrap(), parsed);
            assert_eq!(parsed.to_string(), s);
        }
    }

    #[test]
    fn test_ordering_absent_before_present() {
        let year = CalendarDate::from_year(2015);
        let year_month = CalendarDate::from_year_month(2015, 1);
        let full = CalendarDate::from_ymd(2015, 1, 1);
        assert!(year < year_month);
        assert!(year_month < full);
        assert!(CalendarDate::from_ymd(2014, 12, 31) < year);
        assert!(CalendarDate::from_year_month(2015, 2) > full);
    }

    #[test]
    fn test_constructed_years_stay_parseable() {
        assert_eq!(CalendarDate::from_year(-5).year(), 0);
        assert_eq!(CalendarDate::from_ymd(12345, 6, 7).to_string(), "9999-06-07");

        let mut date = CalendarDate::from_year_month(2015, 3);
        date.set_year(-1);
        assert_eq!(date.to_string(), "0000-03");

        for year in [i32::MIN, -5, 0, 42, 9999, 10_000, i32::MAX] {
            let date = CalendarDate::from_year(year);
            assert_eq!(CalendarDate::parse(&date.to_string()).unwrap(), date, "year {}", year);
        }
    }

    #[test]
    fn test_today_uses_clock_local_date() {
        let at = DateTime::parse_from_rfc3339("2015-03-28T23:30:00-05:00").unwrap();
        let today = CalendarDate::today_with(&FixedClock::new(at));
        assert_eq!(today, CalendarDate::from_ymd(2015, 3, 28));
    }
}
