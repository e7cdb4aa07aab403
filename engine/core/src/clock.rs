//! Time Source
//!
//! Every time-dependent rule in the engine (snapshot spacing, passive XP,
//! rolling care windows, calendar-day streaks, the post-evolution
//! celebration window) reads time through the [`Clock`] trait. The host
//! runs on [`SystemClock`]; tests and the fast-forward simulator drive a
//! [`ManualClock`] so that days can elapse without sleeping.
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use pet_engine_core::clock::{Clock, ManualClock};
//!
//! let clock = ManualClock::new();
//! let start = clock.now();
//! clock.advance(Duration::minutes(5));
//! assert_eq!(clock.now() - start, Duration::minutes(5));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

// =============================================================================
// Clock Trait
// =============================================================================

/// Source of "now" for the engine
///
/// `local_date` maps an instant onto the calendar the pet owner lives in;
/// daily aggregates, perfect-care streaks and holiday checks all use it.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of `at` in the owner's calendar
    ///
    /// Defaults to the UTC date.
    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.date_naive()
    }

    /// Calendar date of the current instant
    fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }
}

/// Shared handle to a clock, as held by every engine component
pub type SharedClock = Arc<dyn Clock>;

// =============================================================================
// System Clock
// =============================================================================

/// Wall-clock time with the machine's local calendar
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a shared system clock handle
    #[must_use]
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&Local).date_naive()
    }
}

// =============================================================================
// Manual Clock
// =============================================================================

/// Deterministic clock that only moves when told to
///
/// Clones share the same underlying instant, so a test can hand one clone to
/// the engine and keep another to advance time. Calendar dates are UTC.
#[derive(Debug, Clone)]
pub struct ManualClock {
    /// Current time in milliseconds since the Unix epoch
    current_ms: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock at a fixed, unremarkable starting instant
    ///
    /// The start (Monday 2024-03-04 09:00 UTC) is not one of the holiday
    /// dates, so special-date rules stay quiet unless a test moves there.
    #[must_use]
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 3, 4, 9, 0, 0)
            .single()
            .unwrap_or_default();
        Self::at(start)
    }

    /// Create a clock starting at `start`
    #[must_use]
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            current_ms: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    /// Create a clock at 12:00 UTC on the given calendar date
    ///
    /// Invalid dates fall back to [`ManualClock::new`].
    #[must_use]
    pub fn on_date(year: i32, month: u32, day: u32) -> Self {
        match Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).single() {
            Some(start) => Self::at(start),
            None => Self::new(),
        }
    }

    /// Box this clock as a [`SharedClock`] while keeping `self` usable
    #[must_use]
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }

    /// Move time forward by `delta`
    ///
    /// Negative deltas are ignored; time only moves forward.
    pub fn advance(&self, delta: Duration) -> DateTime<Utc> {
        let ms = delta.num_milliseconds().max(0);
        let new_ms = self
            .current_ms
            .fetch_add(ms, Ordering::SeqCst)
            .saturating_add(ms);
        from_millis(new_ms)
    }

    /// Move time forward by whole seconds
    pub fn advance_secs(&self, secs: i64) -> DateTime<Utc> {
        self.advance(Duration::seconds(secs))
    }

    /// Move time forward by whole minutes
    pub fn advance_minutes(&self, minutes: i64) -> DateTime<Utc> {
        self.advance(Duration::minutes(minutes))
    }

    /// Move time forward by whole days
    pub fn advance_days(&self, days: i64) -> DateTime<Utc> {
        self.advance(Duration::days(days))
    }

    /// Jump to an absolute instant (may move backwards; tests only)
    pub fn set(&self, at: DateTime<Utc>) {
        self.current_ms.store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        from_millis(self.current_ms.load(Ordering::SeqCst))
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

// =============================================================================
// Serde helpers: instants as fractional Unix seconds
// =============================================================================

/// Serialize `DateTime<Utc>` as fractional Unix seconds (`1709542800.25`)
///
/// Persisted saves store instants this way; integer seconds are accepted on
/// load as well.
pub(crate) mod unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::cast_precision_loss)]
    pub fn to_secs(at: &DateTime<Utc>) -> f64 {
        at.timestamp_millis() as f64 / 1000.0
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn from_secs(secs: f64) -> DateTime<Utc> {
        if !secs.is_finite() {
            return DateTime::default();
        }
        DateTime::from_timestamp_millis((secs * 1000.0).round() as i64).unwrap_or_default()
    }

    pub fn serialize<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        to_secs(at).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(from_secs(secs))
    }

    /// Optional instants; `null`, missing and non-positive values all mean "never"
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S>(at: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            at.as_ref().map(super::to_secs).serialize(serializer)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let secs = Option::<f64>::deserialize(deserializer)?;
            Ok(secs.filter(|s| *s > 0.0).map(super::from_secs))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
