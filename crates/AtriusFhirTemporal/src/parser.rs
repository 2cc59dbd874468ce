//! Single-pass scanner shared by all FHIR temporal types.
//!
//! The scanner walks the input left to right and never backtracks across the
//! date/time boundary:
//!
//! ```text
//! YYYY [-MM [-DD]] [T hh:mm [:ss[.fff...]] [Z | ±hh:mm | ±hhmm | ±hh]]
//! ```
//!
//! Only a missing or five-digit year is fatal. A bad month or day lowers the
//! date precision, a bad hour or minute drops the whole time, seconds of 60
//! or more drop only the seconds, and trailing content is ignored. Whatever
//! was captured before the scan stopped being unambiguous is returned.

use tracing::debug;
use crate::date::{CalendarDate, DAY_RANGE, MONTH_RANGE};
use crate::error::{TemporalError, TemporalResult};
use crate::time::ClockTime;
use crate::timezone::TimezoneOffset;

/// Years must stay below this value.
const YEAR_LIMIT: u64 = 10_000;

/// What the scanner expects at the start of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// A date only; anything after the date is ignored.
    Date,
    /// A date, optionally followed by `T`, a time and a timezone.
    DateTime,
    /// A time of day without date or timezone (a leading `T` is tolerated).
    Time,
}

/// The components captured by a scan.
///
/// In [`ParseMode::Date`] and [`ParseMode::DateTime`] a successful scan
/// always has a `date`; in [`ParseMode::Time`] it never does. A `zone` is only
/// captured after a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTemporal {
    pub date: Option<CalendarDate>,
    pub time: Option<ClockTime>,
    pub zone: Option<TimezoneOffset>,
}

impl ParsedTemporal {
    /// The timezone text exactly as it appeared in the input.
    pub fn raw_zone_text(&self) -> Option<&str> {
        self.zone.as_ref().and_then(TimezoneOffset::raw_text)
    }
}

/// Scanning parser over a single input string.
///
/// Each parser owns its cursor, so independent parses can run concurrently.
///
/// # Examples
/// ```rust
/// use atrius_fhir_temporal::{ParseMode, TemporalParser};
///
/// let parsed = TemporalParser::new("2015-03-28T02:33:29.1285-05:30", ParseMode::DateTime)
///     .parse()
///     .unwrap();
/// assert_eq!(parsed.date.unwrap().to_string(), "2015-03-28");
/// assert_eq!(parsed.time.unwrap().to_string(), "02:33:29.1285");
/// assert_eq!(parsed.zone.as_ref().unwrap().offset_minutes(), -330);
/// ```
#[derive(Debug, Clone)]
pub struct TemporalParser<'i> {
    input: &'i str,
    pos: usize,
    mode: ParseMode,
}

impl<'i> TemporalParser<'i> {
    pub fn new(input: &'i str, mode: ParseMode) -> Self {
        Self {
            input,
            pos: 0,
            mode,
        }
    }

    /// Scans the whole input.
    ///
    /// Fails with [`TemporalError::Empty`] on empty input and with
    /// [`TemporalError::InvalidYear`] when a date is expected but no year
    /// below 10000 starts the input. Every other malformation degrades the
    /// result instead of failing.
    pub fn parse(mut self) -> TemporalResult<ParsedTemporal> {
        if self.input.is_empty() {
            return Err(TemporalError::Empty);
        }

        let mut parsed = ParsedTemporal::default();
        match self.mode {
            ParseMode::Time => {
                self.eat(b'T');
            }
            ParseMode::Date | ParseMode::DateTime => {
                let date = self
                    .scan_date()
                    .ok_or_else(|| TemporalError::InvalidYear(self.input.to_string()))?;
                parsed.date = Some(date);
                if self.mode == ParseMode::Date || !self.eat(b'T') {
                    self.note_trailing();
                    return Ok(parsed);
                }
            }
        }

        parsed.time = self.scan_time();
        if parsed.time.is_some() && self.mode == ParseMode::DateTime {
            parsed.zone = self.scan_zone();
        }
        self.note_trailing();
        Ok(parsed)
    }

    /// Scans a timezone suffix at the start of `input`.
    pub fn parse_zone(input: &'i str) -> Option<TimezoneOffset> {
        Self::new(input, ParseMode::DateTime).scan_zone()
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn two_digits_at(&self, offset: usize) -> Option<u32> {
        let tens = self.peek_at(offset).filter(u8::is_ascii_digit)?;
        let ones = self.peek_at(offset + 1).filter(u8::is_ascii_digit)?;
        Some(u32::from(tens - b'0') * 10 + u32::from(ones - b'0'))
    }

    fn digit_run(&self) -> usize {
        self.input.as_bytes()[self.pos..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    }

    /// Consumes a run of digits; saturates instead of overflowing.
    fn scan_number(&mut self) -> Option<u64> {
        let run = self.digit_run();
        if run == 0 {
            return None;
        }
        let value = self.input.as_bytes()[self.pos..self.pos + run]
            .iter()
            .fold(0u64, |acc, b| acc.saturating_mul(10).saturating_add(u64::from(b - b'0')));
        self.pos += run;
        Some(value)
    }

    /// Consumes `ss` or `ss.fff...` and returns the matched text.
    fn scan_decimal(&mut self) -> Option<&'i str> {
        let start = self.pos;
        self.scan_number()?;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            self.scan_number();
        }
        Some(&self.input[start..self.pos])
    }

    fn scan_date(&mut self) -> Option<CalendarDate> {
        let Some(year) = self.scan_number().filter(|y| *y < YEAR_LIMIT) else {
            debug!("No usable year at the start of '{}'", self.input);
            return None;
        };
        // YEAR_LIMIT keeps the year well inside i32
        let mut date = CalendarDate::from_year(year as i32);

        if !self.eat(b'-') {
            return Some(date);
        }
        let month = self.scan_number();
        match month.and_then(|m| u32::try_from(m).ok()).filter(|m| MONTH_RANGE.contains(m)) {
            Some(month) => date.set_month(Some(month)),
            None => {
                debug!("Ignoring invalid month {:?} in '{}'", month, self.input);
                return Some(date);
            }
        }

        if !self.eat(b'-') {
            return Some(date);
        }
        let day = self.scan_number();
        match day.and_then(|d| u32::try_from(d).ok()).filter(|d| DAY_RANGE.contains(d)) {
            Some(day) => date.set_day(Some(day)),
            None => debug!("Ignoring invalid day {:?} in '{}'", day, self.input),
        }
        Some(date)
    }

    fn scan_time(&mut self) -> Option<ClockTime> {
        let hour = self.scan_number().filter(|h| *h < 24);
        let Some(hour) = hour.filter(|_| self.eat(b':')) else {
            debug!("Ignoring time with invalid hour in '{}'", self.input);
            return None;
        };
        let Some(minute) = self.scan_number().filter(|m| *m < 60) else {
            debug!("Ignoring time with invalid minute in '{}'", self.input);
            return None;
        };
        // Both bounded above, the casts cannot truncate
        let (hour, minute) = (hour as u32, minute as u32);

        if !self.eat(b':') {
            return Some(ClockTime::from_hm(hour, minute));
        }
        Some(match self.scan_decimal() {
            Some(raw) => ClockTime::with_raw_seconds(hour, minute, raw),
            None => ClockTime::from_hm(hour, minute),
        })
    }

    fn scan_zone(&mut self) -> Option<TimezoneOffset> {
        let start = self.pos;
        let sign = match self.peek()? {
            b'Z' => {
                self.pos += 1;
                return Some(TimezoneOffset::from_parsed(0, "Z"));
            }
            b'+' => 1,
            b'-' => -1,
            _ => return None,
        };
        self.pos += 1;

        let run = self.digit_run();
        let (hours, minutes) = if run >= 4 {
            let hhmm = (self.two_digits_at(0)?, self.two_digits_at(2)?);
            self.pos += 4;
            hhmm
        } else if run == 2 {
            let hours = self.two_digits_at(0)?;
            self.pos += 2;
            match (self.peek(), self.two_digits_at(1)) {
                (Some(b':'), Some(minutes)) => {
                    self.pos += 3;
                    (hours, minutes)
                }
                _ => (hours, 0),
            }
        } else {
            debug!("Ignoring malformed timezone in '{}'", self.input);
            return None;
        };

        if hours >= 24 || minutes >= 60 {
            debug!("Ignoring out-of-range timezone {}:{} in '{}'", hours, minutes, self.input);
            return None;
        }
        let offset = sign * (hours * 60 + minutes) as i32;
        Some(TimezoneOffset::from_parsed(offset, &self.input[start..self.pos]))
    }

    fn note_trailing(&self) {
        if self.pos < self.input.len() {
            debug!("Ignoring trailing '{}' in '{}'", &self.input[self.pos..], self.input);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> ParsedTemporal {
        TemporalParser::new(input, ParseMode::DateTime).parse().unwrap()
    }

    fn date_of(input: &str) -> (i32, Option<u32>, Option<u32>) {
        let date = scan(input).date.unwrap();
        (date.year(), date.month(), date.day())
    }

    #[test]
    fn test_date_precision_levels() {
        assert_eq!(date_of("2015"), (2015, None, None));
        assert_eq!(date_of("2015-03"), (2015, Some(3), None));
        assert_eq!(date_of("2015-03-28"), (2015, Some(3), Some(28)));
        assert_eq!(date_of("0001"), (1, None, None));
        assert_eq!(date_of("9999-12-31"), (9999, Some(12), Some(31)));
    }

    #[test]
    fn test_invalid_month_and_day_degrade() {
        assert_eq!(date_of("2015-83"), (2015, None, None));
        assert_eq!(date_of("2015-83-12"), (2015, None, None));
        assert_eq!(date_of("2015-03-54"), (2015, Some(3), None));
        assert_eq!(date_of("2015-"), (2015, None, None));
        assert_eq!(date_of("2015-03-"), (2015, Some(3), None));
        assert_eq!(date_of("2015-99999999999999999999999"), (2015, None, None));
    }

    #[test]
    fn test_year_failures() {
        let parse = |s: &str| TemporalParser::new(s, ParseMode::DateTime).parse();
        assert_eq!(parse("201512"), Err(TemporalError::InvalidYear("201512".to_string())));
        assert_eq!(parse("10000"), Err(TemporalError::InvalidYear("10000".to_string())));
        assert_eq!(parse("T10:00"), Err(TemporalError::InvalidYear("T10:00".to_string())));
        assert_eq!(parse(""), Err(TemporalError::Empty));
    }

    #[test]
    fn test_time_and_zone_capture() {
        let parsed = scan("2015-03-28T02:33:29.1285-05:30");
        let time = parsed.time.as_ref().unwrap();
        assert_eq!((time.hour(), time.minute()), (2, 33));
        assert_eq!(time.raw_seconds(), Some("29.1285"));
        assert_eq!(parsed.zone.as_ref().unwrap().offset_minutes(), -330);
        assert_eq!(parsed.raw_zone_text(), Some("-05:30"));

        let parsed = scan("2015-03-28T02:33:29-0500");
        assert_eq!(parsed.zone.as_ref().unwrap().offset_minutes(), -300);
        assert_eq!(parsed.raw_zone_text(), Some("-0500"));

        let parsed = scan("2015-03-28T02:33+01");
        assert_eq!(parsed.time.as_ref().unwrap().second(), None);
        assert_eq!(parsed.zone.as_ref().unwrap().offset_minutes(), 60);
        assert_eq!(parsed.raw_zone_text(), Some("+01"));

        let parsed = scan("2015-03-28T02:33:29Z");
        assert!(parsed.zone.as_ref().unwrap().is_utc());
        assert_eq!(parsed.raw_zone_text(), Some("Z"));
    }

    #[test]
    fn test_malformed_time_keeps_date() {
        for input in ["2015-03-28T24:00", "2015-03-28T10", "2015-03-28T10:60", "2015-03-28T", "2015-03-28Tab"] {
            let parsed = scan(input);
            assert_eq!(parsed.date, Some(CalendarDate::from_ymd(2015, 3, 28)), "{}", input);
            assert_eq!(parsed.time, None, "{}", input);
            assert_eq!(parsed.zone, None, "{}", input);
        }
    }

    #[test]
    fn test_overflowed_seconds_keep_minutes_and_zone() {
        let parsed = scan("2015-03-28T18:44:88+02:00");
        let time = parsed.time.unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (18, 44, None));
        assert_eq!(parsed.zone.unwrap().offset_minutes(), 120);
    }

    #[test]
    fn test_date_without_marker_stops() {
        let parsed = scan("2015-03-28 10:00");
        assert_eq!(parsed.time, None);
        let parsed = TemporalParser::new("2015-03-28T10:00", ParseMode::Date).parse().unwrap();
        assert_eq!(parsed.time, None);
    }

    #[test]
    fn test_time_mode() {
        let parsed = TemporalParser::new("18:44:88", ParseMode::Time).parse().unwrap();
        assert_eq!(parsed.date, None);
        assert_eq!(parsed.time.unwrap().to_string(), "18:44");

        let parsed = TemporalParser::new("T07:05:00.5Z", ParseMode::Time).parse().unwrap();
        assert_eq!(parsed.time.unwrap().to_string(), "07:05:00.5");
        assert_eq!(parsed.zone, None);

        let parsed = TemporalParser::new("bogus", ParseMode::Time).parse().unwrap();
        assert_eq!(parsed.time, None);
    }

    #[test]
    fn test_zone_forms() {
        let minutes = |s: &str| TemporalParser::parse_zone(s).map(|z| z.offset_minutes());
        assert_eq!(minutes("Z"), Some(0));
        assert_eq!(minutes("+05:30"), Some(330));
        assert_eq!(minutes("-0530"), Some(-330));
        assert_eq!(minutes("-05"), Some(-300));
        assert_eq!(minutes("+05:3"), Some(300));
        assert_eq!(minutes("+053012"), Some(330));
        assert_eq!(minutes("+5"), None);
        assert_eq!(minutes("+123"), None);
        assert_eq!(minutes("+24:00"), None);
        assert_eq!(minutes("+01:75"), None);
        assert_eq!(minutes("05:00"), None);
        assert_eq!(minutes(""), None);

        let zone = TemporalParser::parse_zone("+05:3").unwrap();
        assert_eq!(zone.raw_text(), Some("+05"));
    }

    #[test]
    fn test_trailing_content_ignored() {
        let parsed = scan("2015-03-28T02:33:29+01:00[Europe/Paris]");
        assert_eq!(parsed.raw_zone_text(), Some("+01:00"));
        let parsed = scan("2015-03-28T02:33:29.5.6");
        assert_eq!(parsed.time.unwrap().raw_seconds(), Some("29.5"));
        let parsed = scan("2015-03-28T02:33:29.");
        assert_eq!(parsed.time.unwrap().raw_seconds(), Some("29"));
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        let parsed = scan("2015-03-28T02:33:29é");
        assert_eq!(parsed.time.unwrap().to_string(), "02:33:29");
        assert!(TemporalParser::new("é", ParseMode::DateTime).parse().is_err());
        assert_eq!(TemporalParser::parse_zone("+é"), None);
    }
}
