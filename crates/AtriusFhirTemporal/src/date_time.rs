use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use chrono::{DateTime as ChronoDateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use crate::clock::{HostClock, SystemClock};
use crate::date::{CalendarDate, DatePrecision};
use crate::error::{TemporalError, TemporalResult};
use crate::native;
use crate::parser::{ParseMode, TemporalParser};
use crate::time::{ClockTime, TimePrecision};
use crate::timezone::TimezoneOffset;

/// Precision levels for FHIR DateTime values.
///
/// FHIR datetimes support partial precision from year-only through
/// sub-second precision with optional timezone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateTimePrecision {
    /// Year only (YYYY)
    Year,
    /// Year and month (YYYY-MM)
    YearMonth,
    /// Date only (YYYY-MM-DD)
    Date,
    /// Date with hour and minute (YYYY-MM-DDTHH:MM)
    DateHourMinute,
    /// Date with time to seconds (YYYY-MM-DDTHH:MM:SS)
    DateHourMinuteSecond,
    /// Full datetime with sub-second precision (YYYY-MM-DDTHH:MM:SS.sss)
    Full,
}

/// A FHIR value type with a textual wire form.
///
/// Implemented by the four FHIR temporal primitives so the model layer can
/// parse, print and report them uniformly.
pub trait FhirTemporal: Sized + fmt::Display + FromStr<Err = TemporalError> {
    /// The FHIR primitive type name (`date`, `time`, `dateTime`, `instant`).
    const FHIR_TYPE: &'static str;

    /// Parses the wire form.
    fn parse_fhir(s: &str) -> TemporalResult<Self> {
        s.parse()
    }

    /// Returns the wire form.
    fn to_fhir_string(&self) -> String {
        self.to_string()
    }
}

/// Precision-aware FHIR DateTime type.
///
/// Holds a partial date plus an optional time and timezone. Whenever a time
/// is present a zone is too: a time given without one picks up the host's
/// local offset, captured once at construction and printed canonically.
///
/// # FHIR DateTime Formats
/// - `YYYY`, `YYYY-MM`, `YYYY-MM-DD` - Date only
/// - `YYYY-MM-DDThh:mm[:ss[.fff...]]` followed by `Z`, `±hh:mm`, `±hhmm` or `±hh`
///
/// # Examples
/// ```rust
/// use atrius_fhir_temporal::{DateTimeValue, DateTimePrecision};
///
/// let date_only = DateTimeValue::parse("2015-03").unwrap();
/// assert_eq!(date_only.precision(), DateTimePrecision::YearMonth);
///
/// let full = DateTimeValue::parse("2015-03-28T02:33:29.1285-05:30").unwrap();
/// assert_eq!(full.precision(), DateTimePrecision::Full);
/// assert_eq!(full.to_string(), "2015-03-28T02:33:29.1285-05:30");
///
/// // A bad time is dropped, the date survives
/// let degraded = DateTimeValue::parse("2015-03-28T25:00").unwrap();
/// assert_eq!(degraded.to_string(), "2015-03-28");
/// ```
#[derive(Debug, Clone)]
pub struct DateTimeValue {
    /// Date components
    date: CalendarDate,
    /// Time components (if precision includes time)
    time: Option<ClockTime>,
    /// Timezone, always present alongside a time
    zone: Option<TimezoneOffset>,
}

impl DateTimeValue {
    /// Creates a datetime, defaulting the zone of a zoneless time to the
    /// system clock's local offset.
    pub fn new(date: CalendarDate, time: Option<ClockTime>, zone: Option<TimezoneOffset>) -> Self {
        Self::new_with_clock(date, time, zone, &SystemClock)
    }

    /// Creates a datetime, defaulting the zone of a zoneless time to
    /// `clock`'s local offset.
    pub fn new_with_clock<C: HostClock + ?Sized>(
        date: CalendarDate,
        time: Option<ClockTime>,
        zone: Option<TimezoneOffset>,
        clock: &C,
    ) -> Self {
        let zone = match (&time, zone) {
            (Some(_), None) => Some(TimezoneOffset::local_with(clock)),
            (_, zone) => zone,
        };
        Self { date, time, zone }
    }

    /// Parses a FHIR datetime string, preserving precision and timezone.
    ///
    /// Fails only when no date can be read at all.
    pub fn parse(s: &str) -> TemporalResult<Self> {
        Self::parse_with_clock(s, &SystemClock)
    }

    /// Parses like [`DateTimeValue::parse`], taking the local offset from `clock`.
    pub fn parse_with_clock<C: HostClock + ?Sized>(s: &str, clock: &C) -> TemporalResult<Self> {
        let parsed = TemporalParser::new(s, ParseMode::DateTime).parse()?;
        let date = parsed
            .date
            .ok_or_else(|| TemporalError::InvalidYear(s.to_string()))?;
        Ok(Self::new_with_clock(date, parsed.time, parsed.zone, clock))
    }

    /// The current date and time according to the system clock.
    pub fn now() -> Self {
        Self::now_with(&SystemClock)
    }

    /// The current date and time according to `clock`, in its local offset.
    pub fn now_with<C: HostClock + ?Sized>(clock: &C) -> Self {
        Self::from(clock.now())
    }

    pub fn date(&self) -> &CalendarDate {
        &self.date
    }

    pub fn date_mut(&mut self) -> &mut CalendarDate {
        &mut self.date
    }

    pub fn time(&self) -> Option<&ClockTime> {
        self.time.as_ref()
    }

    pub fn time_mut(&mut self) -> Option<&mut ClockTime> {
        self.time.as_mut()
    }

    pub fn zone(&self) -> Option<&TimezoneOffset> {
        self.zone.as_ref()
    }

    pub fn zone_mut(&mut self) -> Option<&mut TimezoneOffset> {
        self.zone.as_mut()
    }

    /// Returns the precision level of this datetime.
    pub fn precision(&self) -> DateTimePrecision {
        match &self.time {
            None => match self.date.precision() {
                DatePrecision::Year => DateTimePrecision::Year,
                DatePrecision::YearMonth => DateTimePrecision::YearMonth,
                DatePrecision::Full => DateTimePrecision::Date,
            },
            Some(time) => match time.precision() {
                TimePrecision::HourMinute => DateTimePrecision::DateHourMinute,
                TimePrecision::Second => DateTimePrecision::DateHourMinuteSecond,
                TimePrecision::Fraction => DateTimePrecision::Full,
            },
        }
    }

    /// Converts to a chrono value; missing parts are filled per [`native::to_native`].
    pub fn to_native(&self) -> TemporalResult<ChronoDateTime<FixedOffset>> {
        native::to_native(&self.date, self.time.as_ref(), self.zone.as_ref())
    }

    /// Converts to a chrono DateTime<Utc>.
    pub fn to_utc(&self) -> TemporalResult<ChronoDateTime<Utc>> {
        self.to_native().map(|value| value.with_timezone(&Utc))
    }
}

impl Default for DateTimeValue {
    fn default() -> Self {
        // Default to Unix epoch date 1970-01-01
        Self::from(CalendarDate::default())
    }
}

impl From<CalendarDate> for DateTimeValue {
    fn from(date: CalendarDate) -> Self {
        Self {
            date,
            time: None,
            zone: None,
        }
    }
}

impl From<ChronoDateTime<FixedOffset>> for DateTimeValue {
    fn from(value: ChronoDateTime<FixedOffset>) -> Self {
        let (date, time, zone) = native::from_native(&value);
        Self {
            date,
            time: Some(time),
            zone: Some(zone),
        }
    }
}

impl From<ChronoDateTime<Utc>> for DateTimeValue {
    fn from(value: ChronoDateTime<Utc>) -> Self {
        let (date, time, zone) = native::from_utc(&value);
        Self {
            date,
            time: Some(time),
            zone: Some(zone),
        }
    }
}

impl From<InstantValue> for DateTimeValue {
    fn from(instant: InstantValue) -> Self {
        Self {
            date: instant.date,
            time: Some(instant.time),
            zone: Some(instant.zone),
        }
    }
}

impl FromStr for DateTimeValue {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)?;
        if let (Some(time), Some(zone)) = (&self.time, &self.zone) {
            write!(f, "T{}{}", time, zone)?;
        }
        Ok(())
    }
}

impl PartialEq for DateTimeValue {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date && self.time == other.time && self.zone == other.zone
    }
}

impl Eq for DateTimeValue {}

/// Datetimes without a time compare by date. Datetimes with a time compare
/// as absolute instants, ties broken by their fields. A datetime with a time
/// and one without are not comparable.
impl PartialOrd for DateTimeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (&self.time, &other.time) {
            (None, None) => Some(
                self.date
                    .cmp(&other.date)
                    .then_with(|| self.zone.cmp(&other.zone)),
            ),
            (Some(time), Some(other_time)) => Some(
                instant_order(self.to_native(), other.to_native())
                    .then_with(|| self.date.cmp(&other.date))
                    .then_with(|| time.cmp(other_time))
                    .then_with(|| self.zone.cmp(&other.zone)),
            ),
            _ => None,
        }
    }
}

/// Representable values order by absolute instant and come before every
/// value with no chrono counterpart (e.g. `2015-02-31`). Two unrepresentable
/// values are equal here and fall through to the field tiebreak.
fn instant_order(
    left: TemporalResult<ChronoDateTime<FixedOffset>>,
    right: TemporalResult<ChronoDateTime<FixedOffset>>,
) -> Ordering {
    match (left, right) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => Ordering::Equal,
    }
}

impl Default for InstantValue {
    fn default() -> Self {
        // Default to Unix epoch 1970-01-01T00:00:00Z
        Self::new(CalendarDate::default(), ClockTime::default(), TimezoneOffset::utc())
    }
}

/// A FHIR instant: a complete timestamp with seconds and timezone.
///
/// Unlike [`DateTimeValue`], parsing never degrades: a string missing the
/// month, day, seconds or zone is rejected. Programmatic construction fills
/// a missing month or day with 1 and missing seconds with 0.
///
/// # Examples
/// ```rust
/// use atrius_fhir_temporal::{InstantValue, TemporalError};
///
/// let instant = InstantValue::parse("2015-03-28T02:33:29+01:00").unwrap();
/// assert_eq!(instant.to_string(), "2015-03-28T02:33:29+01:00");
///
/// assert!(matches!(
///     InstantValue::parse("2015-03-28T02:33"),
///     Err(TemporalError::IncompleteInstant { missing: "seconds", .. })
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct InstantValue {
    date: CalendarDate,
    time: ClockTime,
    zone: TimezoneOffset,
}

impl InstantValue {
    /// Creates an instant, filling a missing month/day with 1 and missing
    /// seconds with 0.
    pub fn new(date: CalendarDate, time: ClockTime, zone: TimezoneOffset) -> Self {
        Self {
            date: Self::complete_date(date),
            time: Self::complete_time(time),
            zone,
        }
    }

    fn complete_date(date: CalendarDate) -> CalendarDate {
        CalendarDate::from_ymd(
            date.year(),
            date.month().unwrap_or(1),
            date.day().unwrap_or(1),
        )
    }

    fn complete_time(time: ClockTime) -> ClockTime {
        match time.second() {
            Some(_) => time,
            None => ClockTime::new(time.hour(), time.minute(), Some(Decimal::ZERO)),
        }
    }

    /// Parses a FHIR instant string.
    ///
    /// Month, day, seconds and timezone must all be present.
    pub fn parse(s: &str) -> TemporalResult<Self> {
        let parsed = TemporalParser::new(s, ParseMode::DateTime).parse()?;
        let date = parsed
            .date
            .ok_or_else(|| TemporalError::InvalidYear(s.to_string()))?;
        Self::from_complete_parts(s, date, parsed.time, parsed.zone)
    }

    fn from_complete_parts(
        input: &str,
        date: CalendarDate,
        time: Option<ClockTime>,
        zone: Option<TimezoneOffset>,
    ) -> TemporalResult<Self> {
        let incomplete = |missing| TemporalError::IncompleteInstant {
            input: input.to_string(),
            missing,
        };
        if date.month().is_none() {
            return Err(incomplete("month"));
        }
        if date.day().is_none() {
            return Err(incomplete("day"));
        }
        let time = time.ok_or_else(|| incomplete("time"))?;
        if time.second().is_none() {
            return Err(incomplete("seconds"));
        }
        let zone = zone.ok_or_else(|| incomplete("timezone"))?;
        Ok(Self { date, time, zone })
    }

    /// The current instant according to the system clock.
    pub fn now() -> Self {
        Self::now_with(&SystemClock)
    }

    /// The current instant according to `clock`, in its local offset.
    pub fn now_with<C: HostClock + ?Sized>(clock: &C) -> Self {
        Self::from(clock.now())
    }

    pub fn date(&self) -> &CalendarDate {
        &self.date
    }

    pub fn time(&self) -> &ClockTime {
        &self.time
    }

    pub fn zone(&self) -> &TimezoneOffset {
        &self.zone
    }

    pub fn zone_mut(&mut self) -> &mut TimezoneOffset {
        &mut self.zone
    }

    /// Replaces the date, filling a missing month/day with 1.
    pub fn set_date(&mut self, date: CalendarDate) {
        self.date = Self::complete_date(date);
    }

    /// Replaces the time, filling missing seconds with 0.
    pub fn set_time(&mut self, time: ClockTime) {
        self.time = Self::complete_time(time);
    }

    /// Converts to a chrono value in the instant's own offset.
    pub fn to_native(&self) -> TemporalResult<ChronoDateTime<FixedOffset>> {
        native::to_native(&self.date, Some(&self.time), Some(&self.zone))
    }

    /// Converts to a chrono DateTime<Utc>.
    pub fn to_utc(&self) -> TemporalResult<ChronoDateTime<Utc>> {
        self.to_native().map(|value| value.with_timezone(&Utc))
    }
}

impl TryFrom<DateTimeValue> for InstantValue {
    type Error = TemporalError;

    fn try_from(value: DateTimeValue) -> Result<Self, Self::Error> {
        let input = value.to_string();
        Self::from_complete_parts(&input, value.date, value.time, value.zone)
    }
}

impl From<ChronoDateTime<FixedOffset>> for InstantValue {
    fn from(value: ChronoDateTime<FixedOffset>) -> Self {
        let (date, time, zone) = native::from_native(&value);
        Self::new(date, time, zone)
    }
}

impl From<ChronoDateTime<Utc>> for InstantValue {
    fn from(value: ChronoDateTime<Utc>) -> Self {
        let (date, time, zone) = native::from_utc(&value);
        Self::new(date, time, zone)
    }
}

impl FromStr for InstantValue {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}{}", self.date, self.time, self.zone)
    }
}

impl PartialEq for InstantValue {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date && self.time == other.time && self.zone == other.zone
    }
}

impl Eq for InstantValue {}

impl PartialOrd for InstantValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by absolute instant, ties broken by date, time and zone. Instants
/// that cannot be placed on the timeline sort after all others.
impl Ord for InstantValue {
    fn cmp(&self, other: &Self) -> Ordering {
        instant_order(self.to_native(), other.to_native())
            .then_with(|| self.date.cmp(&other.date))
            .then_with(|| self.time.cmp(&other.time))
            .then_with(|| self.zone.cmp(&other.zone))
    }
}

// === Serde Implementations for Temporal Types ===

fn deserialize_temporal<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: FhirTemporal,
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    T::parse_fhir(&s)
        .map_err(|e| de::Error::custom(format!("Invalid FHIR {} format: {}", T::FHIR_TYPE, e)))
}

macro_rules! impl_fhir_temporal {
    ($($ty:ty => $fhir_type:literal),* $(,)?) => {
        $(
            impl FhirTemporal for $ty {
                const FHIR_TYPE: &'static str = $fhir_type;
            }

            impl Serialize for $ty {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: Serializer,
                {
                    // Serialize as a simple string
                    serializer.collect_str(self)
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserialize_temporal(deserializer)
                }
            }
        )*
    };
}

impl_fhir_temporal! {
    CalendarDate => "date",
    ClockTime => "time",
    DateTimeValue => "dateTime",
    InstantValue => "instant",
}
