//! Conversion boundary between the FHIR value types and chrono.
//!
//! Missing components are filled the way the generated model layer expects
//! when it needs an absolute point in time: month and day default to 1, a
//! missing time is midnight, and a missing zone is UTC.

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc};
use crate::date::CalendarDate;
use crate::error::{TemporalError, TemporalResult};
use crate::time::ClockTime;
use crate::timezone::TimezoneOffset;

/// Builds a chrono date-time from FHIR components.
///
/// Fails when the date does not exist (e.g. `2015-02-31`) or the offset is
/// 24 hours or more.
///
/// # Examples
/// ```rust
/// use atrius_fhir_temporal::{native, CalendarDate, ClockTime, TimezoneOffset};
///
/// let date = CalendarDate::from_ymd(2015, 3, 28);
/// let time = ClockTime::parse("02:33:29.5").unwrap();
/// let zone = TimezoneOffset::from_minutes(-300);
/// let native = native::to_native(&date, Some(&time), Some(&zone)).unwrap();
/// assert_eq!(native.to_rfc3339(), "2015-03-28T02:33:29.500-05:00");
/// ```
pub fn to_native(
    date: &CalendarDate,
    time: Option<&ClockTime>,
    zone: Option<&TimezoneOffset>,
) -> TemporalResult<DateTime<FixedOffset>> {
    let naive_date = date.to_naive_date()?;
    let naive_time = match time {
        Some(time) => time.to_naive_time()?,
        None => NaiveTime::MIN,
    };
    let offset = match zone {
        Some(zone) => zone.to_fixed_offset()?,
        None => Utc.fix(),
    };
    naive_date
        .and_time(naive_time)
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| TemporalError::NotRepresentable(format!("{}T{}", date, naive_time)))
}

/// Splits a chrono date-time into full precision FHIR components.
///
/// The zone is canonical (`±hh:mm`), even for a zero offset; use
/// [`from_utc`] to get a `Z` zone.
pub fn from_native(value: &DateTime<FixedOffset>) -> (CalendarDate, ClockTime, TimezoneOffset) {
    (
        CalendarDate::from(value.date_naive()),
        ClockTime::from(value.time()),
        TimezoneOffset::from(*value.offset()),
    )
}

/// Splits a UTC chrono date-time into FHIR components with a `Z` zone.
pub fn from_utc(value: &DateTime<Utc>) -> (CalendarDate, ClockTime, TimezoneOffset) {
    (
        CalendarDate::from(value.date_naive()),
        ClockTime::from(value.time()),
        TimezoneOffset::utc(),
    )
}
