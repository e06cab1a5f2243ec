//! Definition of the [`Clock`] trait and its implementations.

use std::{
    sync::{Mutex, PoisonError},
    time::{Duration, UNIX_EPOCH},
};

use chrono::{DateTime, Utc};

/// Source of wall-clock time.
///
/// Timers compare timestamps taken before and after process restarts,
/// so implementations must report wall-clock time rather than monotonic time.
pub trait Clock: Send + Sync {
    /// Returns current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Represents system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Represents clock which moves only when asked to.
/// Used together with [`ManualScheduler`][super::ManualScheduler] in simulations and tests.
#[derive(Debug)]
pub struct ManualClock {
    /// Time shown by the clock.
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create clock showing specified time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Create clock showing current system time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = shift(*now, by);
    }

    /// Set clock to specified time, possibly moving it backwards.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns `at + by`, saturating at the largest representable time.
pub(crate) fn shift(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|by| at.checked_add_signed(by))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Returns `later - earlier`, or zero if `later` precedes `earlier`.
pub(crate) fn between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Duration {
    (later - earlier).to_std().unwrap_or(Duration::ZERO)
}

/// Timestamp of an uninitialized timer.
pub(crate) fn zero_time() -> DateTime<Utc> {
    DateTime::<Utc>::from(UNIX_EPOCH)
}
