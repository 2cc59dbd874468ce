use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use chrono::FixedOffset;
use crate::clock::{HostClock, SystemClock};
use crate::error::{TemporalError, TemporalResult};
use crate::parser::TemporalParser;

/// A fixed UTC offset as used in FHIR `dateTime` and `instant` values.
///
/// The offset is held in minutes. A zone built from `Z`, `UTC` or `GMT`
/// carries the UTC identity and formats as `Z`; any other zone formats as
/// `±hh:mm`, including a zero offset (`+00:00`). When parsed, the exact
/// offset text (`+01:00`, `-0500`, `-05`) is remembered and written back
/// until the offset is reassigned.
///
/// Equality and ordering only consider the offset in minutes.
///
/// # Examples
/// ```rust
/// use atrius_fhir_temporal::TimezoneOffset;
///
/// assert_eq!(TimezoneOffset::utc().to_string(), "Z");
/// assert_eq!(TimezoneOffset::from_minutes(0).to_string(), "+00:00");
/// assert_eq!(TimezoneOffset::from_minutes(-330).to_string(), "-05:30");
///
/// let parsed = TimezoneOffset::parse("-0500").unwrap();
/// assert_eq!(parsed.offset_minutes(), -300);
/// assert_eq!(parsed.to_string(), "-0500");
/// ```
#[derive(Debug, Clone)]
pub struct TimezoneOffset {
    /// Signed offset from UTC in minutes
    offset_minutes: i32,
    /// Whether this zone is UTC itself rather than some zone at +00:00
    utc: bool,
    /// Offset text as scanned, cleared when the offset is reassigned
    raw: Option<String>,
}

impl TimezoneOffset {
    /// The UTC zone, formatted as `Z`.
    pub fn utc() -> Self {
        Self {
            offset_minutes: 0,
            utc: true,
            raw: None,
        }
    }

    /// A zone at the given offset, formatted canonically as `±hh:mm`.
    pub fn from_minutes(offset_minutes: i32) -> Self {
        Self {
            offset_minutes,
            utc: false,
            raw: None,
        }
    }

    /// Resolves the UTC aliases `Z`, `UTC` and `GMT` (case-insensitive).
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier.to_ascii_uppercase().as_str() {
            "Z" | "UTC" | "GMT" => Some(Self::utc()),
            _ => None,
        }
    }

    pub(crate) fn from_parsed(offset_minutes: i32, raw: &str) -> Self {
        Self {
            offset_minutes,
            utc: raw == "Z",
            raw: Some(raw.to_string()),
        }
    }

    /// The host's local offset according to the system clock.
    pub fn local() -> Self {
        Self::local_with(&SystemClock)
    }

    /// The local offset of `clock`, captured once.
    pub fn local_with<C: HostClock + ?Sized>(clock: &C) -> Self {
        Self::from_minutes(clock.local_offset().local_minus_utc() / 60)
    }

    /// Parses a standalone offset: `Z`, `±hh:mm`, `±hhmm` or `±hh`.
    ///
    /// Text after the offset is ignored.
    pub fn parse(s: &str) -> TemporalResult<Self> {
        if s.is_empty() {
            return Err(TemporalError::Empty);
        }
        TemporalParser::parse_zone(s)
            .or_else(|| Self::from_identifier(s))
            .ok_or_else(|| TemporalError::InvalidTimezone(s.to_string()))
    }

    /// Returns the signed offset from UTC in minutes.
    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }

    /// Returns `true` for the UTC identity (not merely a zero offset).
    pub fn is_utc(&self) -> bool {
        self.utc
    }

    /// Returns the offset text remembered from parsing, if still valid.
    pub fn raw_text(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Reassigns the offset; the zone loses its UTC identity and raw text.
    pub fn set_offset_minutes(&mut self, offset_minutes: i32) {
        *self = Self::from_minutes(offset_minutes);
    }

    /// Returns the offset string, preferring the remembered raw text.
    pub fn offset(&self) -> String {
        self.to_string()
    }

    /// Returns the offset string ignoring any remembered raw text.
    pub fn canonical(&self) -> String {
        if self.utc {
            return "Z".to_string();
        }
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let minutes = self.offset_minutes.unsigned_abs();
        format!("{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
    }

    /// Converts to a chrono offset; fails beyond ±24 hours.
    pub fn to_fixed_offset(&self) -> TemporalResult<FixedOffset> {
        self.offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| TemporalError::NotRepresentable(self.to_string()))
    }
}

impl From<FixedOffset> for TimezoneOffset {
    fn from(offset: FixedOffset) -> Self {
        Self::from_minutes(offset.local_minus_utc() / 60)
    }
}

impl FromStr for TimezoneOffset {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimezoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => f.write_str(raw),
            None => f.write_str(&self.canonical()),
        }
    }
}

impl PartialEq for TimezoneOffset {
    fn eq(&self, other: &Self) -> bool {
        self.offset_minutes == other.offset_minutes
    }
}

impl Eq for TimezoneOffset {}

impl Hash for TimezoneOffset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset_minutes.hash(state);
    }
}

impl PartialOrd for TimezoneOffset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimezoneOffset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset_minutes.cmp(&other.offset_minutes)
    }
}
