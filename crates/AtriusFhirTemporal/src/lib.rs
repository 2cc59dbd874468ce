//! # FHIR temporal primitives
//!
//! Parsing, formatting and comparison of the four FHIR temporal primitive
//! types:
//!
//! | FHIR type  | Rust type         | Example                            |
//! |------------|-------------------|------------------------------------|
//! | `date`     | [`CalendarDate`]  | `2015`, `2015-03`, `2015-03-28`    |
//! | `time`     | [`ClockTime`]     | `02:33`, `02:33:29.1285`           |
//! | `dateTime` | [`DateTimeValue`] | `2015-03`, `2015-03-28T02:33-05:00`|
//! | `instant`  | [`InstantValue`]  | `2015-03-28T02:33:29.1285Z`        |
//!
//! Values keep their precision and, where they came from text, the exact
//! seconds and timezone text, so `parse` followed by `to_string` reproduces
//! the input. Malformed trailing components lower the precision rather than
//! failing the parse; only [`InstantValue`] insists on a complete value.
//!
//! ```rust
//! use atrius_fhir_temporal::{DateTimeValue, InstantValue};
//!
//! let value: DateTimeValue = "2015-03-28T02:33:29.1285-05:30".parse().unwrap();
//! assert_eq!(value.to_string(), "2015-03-28T02:33:29.1285-05:30");
//!
//! let degraded = DateTimeValue::parse("2015-03-54").unwrap();
//! assert_eq!(degraded.to_string(), "2015-03");
//!
//! assert!(InstantValue::parse("2015-03-28").is_err());
//! ```

pub mod clock;
pub mod date;
pub mod date_time;
pub mod error;
pub mod native;
pub mod parser;
pub mod time;
pub mod timezone;

pub use clock::{FixedClock, HostClock, SystemClock};
pub use date::{CalendarDate, DatePrecision};
pub use date_time::{DateTimePrecision, DateTimeValue, FhirTemporal, InstantValue};
pub use error::{TemporalError, TemporalResult};
pub use parser::{ParseMode, ParsedTemporal, TemporalParser};
pub use time::{ClockTime, TimePrecision};
pub use timezone::TimezoneOffset;
