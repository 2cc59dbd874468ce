//! Error types for FHIR temporal parsing and conversion.
//!
//! Only hard failures are represented here. Precision degradation (a dropped
//! month, day, time or seconds component) is not an error: the parser returns
//! the lower precision value instead.

use thiserror::Error;

/// Result type alias for temporal operations
pub type TemporalResult<T> = Result<T, TemporalError>;

/// A hard failure while parsing or converting a FHIR temporal value.
///
/// The variants are discriminated so callers folding parse failures into a
/// per-key validation report can tell why a value was rejected.
///
/// # Examples
///
/// ```rust
/// use atrius_fhir_temporal::{CalendarDate, TemporalError};
///
/// match CalendarDate::parse("201512") {
///     Err(TemporalError::InvalidYear(input)) => assert_eq!(input, "201512"),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemporalError {
    /// The input string was empty.
    #[error("Empty temporal value")]
    Empty,

    /// No year digits were found, or the year has five or more digits.
    ///
    /// No date can be produced at all from such input.
    #[error("Invalid year in '{0}'")]
    InvalidYear(String),

    /// A time-only parse did not find a valid `hh:mm` prefix.
    #[error("Invalid time '{0}'")]
    MissingTime(String),

    /// A standalone offset was neither `Z`, `±hh[:mm]`, `±hhmm` nor a UTC
    /// identifier.
    #[error("Invalid timezone offset '{0}'")]
    InvalidTimezone(String),

    /// An instant lacked one of the components it requires.
    ///
    /// Instants need month, day, seconds and a timezone. `missing` names the
    /// first absent component found.
    #[error("Incomplete instant '{input}': missing {missing}")]
    IncompleteInstant {
        /// The rejected input
        input: String,
        /// The missing component (`month`, `day`, `time`, `seconds` or `timezone`)
        missing: &'static str,
    },

    /// The value has no counterpart in chrono (e.g. `2015-02-31`).
    #[error("Value not representable as a native date/time: {0}")]
    NotRepresentable(String),
}
