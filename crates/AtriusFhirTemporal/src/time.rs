use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;
use crate::clock::{HostClock, SystemClock};
use crate::error::{TemporalError, TemporalResult};
use crate::parser::{ParseMode, TemporalParser};

/// Fraction digits kept when converting scanned seconds text to a number.
/// The text itself is kept in full.
const MAX_FRACTION_DIGITS: usize = 20;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Precision levels for FHIR Time values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimePrecision {
    /// Hour and minute (HH:MM)
    HourMinute,
    /// Hour, minute, and whole second (HH:MM:SS)
    Second,
    /// Time with sub-second precision (HH:MM:SS.sss...)
    Fraction,
}

/// A FHIR time of day.
///
/// Seconds are optional and carried as a `Decimal`. When the value comes
/// from parsing, the scanned seconds text (e.g. `"02.2912"`) is remembered
/// and written back verbatim, until the seconds are reassigned.
///
/// Programmatic construction normalizes overflow: seconds of 60 or more roll
/// into the minute, minutes into the hour, and anything past 23 hours clamps
/// to `23:59:59.999999999`.
///
/// # Examples
/// ```rust
/// use atrius_fhir_temporal::ClockTime;
/// use rust_decimal::Decimal;
///
/// let time = ClockTime::parse("02:33:29.1280").unwrap();
/// assert_eq!(time.to_string(), "02:33:29.1280");
///
/// let rolled = ClockTime::new(10, 59, Some(Decimal::new(125, 0)));
/// assert_eq!(rolled.to_string(), "11:01:05");
/// ```
#[derive(Debug, Clone)]
pub struct ClockTime {
    /// Hour component (0-23)
    hour: u32,
    /// Minute component (0-59)
    minute: u32,
    /// Second component, 0 <= second < 60
    second: Option<Decimal>,
    /// Seconds text as scanned, cleared when `second` changes
    raw_seconds: Option<String>,
}

impl ClockTime {
    /// Creates a time, normalizing overflowed seconds, minutes and hours.
    ///
    /// A negative second is dropped.
    pub fn new(hour: u32, minute: u32, second: Option<Decimal>) -> Self {
        Self::normalized(hour, minute, second, None)
    }

    /// Creates an hour-minute precision time.
    pub fn from_hm(hour: u32, minute: u32) -> Self {
        Self::new(hour, minute, None)
    }

    /// Creates a whole-second precision time.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Self {
        Self::new(hour, minute, Some(Decimal::from(second)))
    }

    /// Creates a time from scanned seconds text, keeping the text for output.
    ///
    /// The seconds are left absent when `raw` is not a plain decimal
    /// (`ss` or `ss.fff...`) or its value is 60 or more.
    pub fn with_raw_seconds(hour: u32, minute: u32, raw: &str) -> Self {
        match seconds_value(raw) {
            Some(second) if second < sixty() => {
                Self::normalized(hour, minute, Some(second), Some(raw.to_string()))
            }
            _ => {
                debug!("Dropping implausible seconds '{}' at {:02}:{:02}", raw, hour, minute);
                Self::normalized(hour, minute, None, None)
            }
        }
    }

    fn normalized(hour: u32, minute: u32, second: Option<Decimal>, raw: Option<String>) -> Self {
        let mut raw = raw;
        let mut carry_minutes = 0u64;
        let second = match second {
            Some(s) if s < Decimal::ZERO => {
                debug!("Dropping negative seconds {}", s);
                raw = None;
                None
            }
            Some(s) if s >= sixty() => {
                carry_minutes = (s / sixty()).trunc().to_u64().unwrap_or(u64::MAX);
                raw = None;
                Some(s % sixty())
            }
            other => other,
        };

        let total_minutes = u64::from(minute).saturating_add(carry_minutes);
        let total_hours = u64::from(hour).saturating_add(total_minutes / 60);
        if total_hours > 23 {
            debug!("Clamping overflowed time {}:{} to end of day", total_hours, total_minutes % 60);
            return Self::end_of_day();
        }

        Self {
            hour: total_hours as u32,
            minute: (total_minutes % 60) as u32,
            second,
            raw_seconds: raw,
        }
    }

    /// The latest representable time, `23:59:59.999999999`.
    pub fn end_of_day() -> Self {
        Self {
            hour: 23,
            minute: 59,
            second: Some(Decimal::new(59_999_999_999, 9)),
            raw_seconds: None,
        }
    }

    /// Returns the current local time according to the system clock.
    pub fn now() -> Self {
        Self::now_with(&SystemClock)
    }

    /// Returns the current time in the local offset of `clock`.
    pub fn now_with<C: HostClock + ?Sized>(clock: &C) -> Self {
        Self::from(clock.now().time())
    }

    /// Parses a FHIR time string (`hh:mm` or `hh:mm:ss[.fff...]`).
    ///
    /// Seconds of 60 or more are dropped, keeping `hh:mm`. Fails when no
    /// valid hour and minute are found.
    pub fn parse(s: &str) -> TemporalResult<Self> {
        TemporalParser::new(s, ParseMode::Time)
            .parse()?
            .time
            .ok_or_else(|| TemporalError::MissingTime(s.to_string()))
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> Option<Decimal> {
        self.second
    }

    /// Returns the seconds text remembered from parsing, if still valid.
    pub fn raw_seconds(&self) -> Option<&str> {
        self.raw_seconds.as_deref()
    }

    /// Reassigns the seconds, forgetting any remembered seconds text.
    pub fn set_second(&mut self, second: Option<Decimal>) {
        *self = Self::new(self.hour, self.minute, second);
    }

    pub fn set_minute(&mut self, minute: u32) {
        *self = Self::normalized(self.hour, minute, self.second, self.raw_seconds.take());
    }

    pub fn set_hour(&mut self, hour: u32) {
        *self = Self::normalized(hour, self.minute, self.second, self.raw_seconds.take());
    }

    /// Returns the precision level of this time.
    pub fn precision(&self) -> TimePrecision {
        match (&self.raw_seconds, self.second) {
            (_, None) => TimePrecision::HourMinute,
            (Some(raw), _) if raw.contains('.') => TimePrecision::Fraction,
            (None, Some(s)) if !s.fract().is_zero() => TimePrecision::Fraction,
            _ => TimePrecision::Second,
        }
    }

    /// Converts to a NaiveTime; missing seconds become zero and digits past
    /// nanoseconds are truncated.
    pub fn to_naive_time(&self) -> TemporalResult<NaiveTime> {
        let second = self.second.unwrap_or_default();
        let whole = second.trunc().to_u32();
        let nanos = (second.fract() * Decimal::from(NANOS_PER_SECOND)).trunc().to_u32();
        whole
            .zip(nanos)
            .and_then(|(s, n)| NaiveTime::from_hms_nano_opt(self.hour, self.minute, s, n))
            .ok_or_else(|| TemporalError::NotRepresentable(self.to_string()))
    }
}

/// Reads a plain `ss[.fff...]` decimal, ignoring fraction digits that don't
/// fit a `Decimal`.
fn seconds_value(raw: &str) -> Option<Decimal> {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
        return None;
    }
    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if fraction.is_empty() {
        Decimal::from_str(whole).ok()
    } else {
        Decimal::from_str(&format!("{}.{}", whole, fraction)).ok()
    }
}

fn sixty() -> Decimal {
    Decimal::from(60)
}

impl Default for ClockTime {
    fn default() -> Self {
        // Default to midnight 00:00:00
        Self::from_hms(0, 0, 0)
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        let nanos = i64::from(time.second()) * NANOS_PER_SECOND + i64::from(time.nanosecond());
        Self::new(time.hour(), time.minute(), Some(Decimal::new(nanos, 9).normalize()))
    }
}

impl FromStr for ClockTime {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)?;
        match (&self.raw_seconds, self.second) {
            (Some(raw), _) => write!(f, ":{}", raw),
            (None, Some(second)) => {
                let second = second.normalize();
                if second < Decimal::TEN {
                    write!(f, ":0{}", second)
                } else {
                    write!(f, ":{}", second)
                }
            }
            (None, None) => Ok(()),
        }
    }
}

/// Times with seconds are equal only when they print identically, so
/// `29` and `29.00` differ even though their values match.
impl PartialEq for ClockTime {
    fn eq(&self, other: &Self) -> bool {
        if self.second.is_some() && other.second.is_some() {
            self.to_string() == other.to_string()
        } else {
            self.hour == other.hour && self.minute == other.minute && self.second == other.second
        }
    }
}

impl Eq for ClockTime {}

impl PartialOrd for ClockTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by hour, minute, then second (absent first). Equal values with
/// different text are ordered by their text.
impl Ord for ClockTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hour
            .cmp(&other.hour)
            .then(self.minute.cmp(&other.minute))
            .then(self.second.cmp(&other.second))
            .then_with(|| match (self.second, other.second) {
                (Some(_), Some(_)) => self.to_string().cmp(&other.to_string()),
                _ => Ordering::Equal,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::DateTime;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_keeps_raw_seconds() {
        let time = ClockTime::parse("02:33:29.1285").unwrap();
        assert_eq!(time.second(), Some(dec!(29.1285)));
        assert_eq!(time.raw_seconds(), Some("29.1285"));
        assert_eq!(time.precision(), TimePrecision::Fraction);
        assert_eq!(time.to_string(), "02:33:29.1285");

        let time = ClockTime::parse("10:02:02.291200").unwrap();
        assert_eq!(time.to_string(), "10:02:02.291200");
    }

    #[test]
    fn test_parse_drops_overflowed_seconds() {
        let time = ClockTime::parse("18:44:88").unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (18, 44, None));
        assert_eq!(time.to_string(), "18:44");
    }

    #[test]
    fn test_parse_rejects_bad_hour_or_minute() {
        assert!(matches!(ClockTime::parse("24:00"), Err(TemporalError::MissingTime(_))));
        assert!(matches!(ClockTime::parse("12:60"), Err(TemporalError::MissingTime(_))));
        assert!(matches!(ClockTime::parse("12"), Err(TemporalError::MissingTime(_))));
    }

    #[test]
    fn test_seconds_overflow_cascades() {
        let time = ClockTime::new(10, 59, Some(dec!(125.5)));
        assert_eq!((time.hour(), time.minute(), time.second()), (11, 1, Some(dec!(5.5))));
        assert_eq!(time.to_string(), "11:01:05.5");

        let time = ClockTime::new(3, 150, None);
        assert_eq!(time.to_string(), "05:30");
    }

    #[test]
    fn test_hour_overflow_clamps_to_end_of_day() {
        let time = ClockTime::new(23, 59, Some(dec!(60)));
        assert_eq!(time, ClockTime::end_of_day());
        assert_eq!(time.to_string(), "23:59:59.999999999");

        let time = ClockTime::new(30, 0, None);
        assert_eq!(time.to_string(), "23:59:59.999999999");
    }

    #[test]
    fn test_raw_seconds_rejected_when_implausible() {
        assert_eq!(ClockTime::with_raw_seconds(1, 2, "60").second(), None);
        assert_eq!(ClockTime::with_raw_seconds(1, 2, "-3").second(), None);
        assert_eq!(ClockTime::with_raw_seconds(1, 2, "abc").second(), None);
        let time = ClockTime::with_raw_seconds(1, 2, "07.50");
        assert_eq!(time.second(), Some(dec!(7.5)));
        assert_eq!(time.to_string(), "01:02:07.50");
    }

    #[test]
    fn test_negative_second_dropped() {
        let time = ClockTime::new(1, 2, Some(dec!(-1)));
        assert_eq!(time.second(), None);
    }

    #[test]
    fn test_set_second_forgets_raw_text() {
        let mut time = ClockTime::parse("02:33:29.100").unwrap();
        assert_eq!(time.to_string(), "02:33:29.100");
        time.set_second(Some(dec!(29.100)));
        assert_eq!(time.raw_seconds(), None);
        assert_eq!(time.to_string(), "02:33:29.1");

        time.set_second(Some(dec!(75)));
        assert_eq!(time.to_string(), "02:34:15");
    }

    #[test]
    fn test_set_minute_keeps_raw_text() {
        let mut time = ClockTime::parse("02:33:29.100").unwrap();
        time.set_minute(10);
        assert_eq!(time.to_string(), "02:10:29.100");
        time.set_hour(25);
        assert_eq!(time, ClockTime::end_of_day());
    }

    #[test]
    fn test_format_general_seconds() {
        assert_eq!(ClockTime::from_hms(1, 2, 3).to_string(), "01:02:03");
        assert_eq!(ClockTime::from_hms(1, 2, 0).to_string(), "01:02:00");
        assert_eq!(ClockTime::new(1, 2, Some(dec!(3.250))).to_string(), "01:02:03.25");
        assert_eq!(ClockTime::new(1, 2, Some(dec!(45.000001))).to_string(), "01:02:45.000001");
        assert_eq!(ClockTime::from_hm(1, 2).to_string(), "01:02");
    }

    #[test]
    fn test_equality_respects_seconds_text() {
        let plain = ClockTime::new(10, 0, Some(dec!(29.0)));
        let raw = ClockTime::with_raw_seconds(10, 0, "29.00");
        assert_eq!(plain.second(), raw.second());
        assert_ne!(plain, raw);
        assert_ne!(plain.cmp(&raw), Ordering::Equal);

        let same = ClockTime::with_raw_seconds(10, 0, "29");
        assert_eq!(plain, same);
        assert_eq!(plain.cmp(&same), Ordering::Equal);
    }

    #[test]
    fn test_ordering() {
        let hm = ClockTime::from_hm(10, 0);
        let hms = ClockTime::from_hms(10, 0, 0);
        assert!(hm < hms);
        assert!(ClockTime::from_hms(9, 59, 59) < hm);
        assert!(ClockTime::new(10, 0, Some(dec!(1.5))) > ClockTime::from_hms(10, 0, 1));
        assert_eq!(hm, ClockTime::from_hm(10, 0));
    }

    #[test]
    fn test_naive_time_conversion() {
        let time = ClockTime::parse("02:33:29.1285").unwrap();
        let naive = time.to_naive_time().unwrap();
        assert_eq!(naive, NaiveTime::from_hms_nano_opt(2, 33, 29, 128_500_000).unwrap());
        assert_eq!(ClockTime::from(naive).to_string(), "02:33:29.1285");
    }

    #[test]
    fn test_now_uses_clock() {
        let at = DateTime::parse_from_rfc3339("2015-03-28T02:33:29.5+01:00").unwrap();
        let now = ClockTime::now_with(&FixedClock::new(at));
        assert_eq!(now.to_string(), "02:33:29.5");
    }
}
