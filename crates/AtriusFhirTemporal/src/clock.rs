//! Host clock boundary.
//!
//! Every "now" style operation and every local offset default goes through a
//! [`HostClock`]. [`SystemClock`] reads the operating system clock through
//! chrono; [`FixedClock`] returns a pinned instant so callers (and tests) get
//! deterministic results.

use chrono::{DateTime, FixedOffset, Local, Utc};
use tracing::trace;

/// Source of the current wall-clock time and the host's UTC offset.
///
/// Implementations must be reentrant; the value types call `now` from any
/// thread without synchronization.
pub trait HostClock: Send + Sync {
    /// Returns the current instant, expressed in the host's local offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Returns the host's local UTC offset at the current instant.
    fn local_offset(&self) -> FixedOffset {
        *self.now().offset()
    }
}

/// The operating system clock and local timezone, read through `chrono::Local`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClock;

impl HostClock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let now = Local::now().fixed_offset();
        trace!("Read system clock: {}", now.to_rfc3339());
        now
    }
}

/// A clock pinned to a single instant.
///
/// # Examples
///
/// ```rust
/// use atrius_fhir_temporal::{FixedClock, HostClock};
/// use chrono::DateTime;
///
/// let at = DateTime::parse_from_rfc3339("2015-03-28T02:33:29-05:00").unwrap();
/// let clock = FixedClock::new(at);
/// assert_eq!(clock.now(), at);
/// assert_eq!(clock.local_offset().local_minus_utc(), -5 * 3600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    at: DateTime<FixedOffset>,
}

impl FixedClock {
    /// Creates a clock that always reports `at`, with `at`'s offset as the local offset.
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self { at }
    }

    /// Creates a clock reporting the UTC instant `at`, viewed from `offset`.
    pub fn from_utc(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            at: at.with_timezone(&offset),
        }
    }
}

impl HostClock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.at
    }
}
