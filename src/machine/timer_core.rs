//! Definition of [`TimerCore`].

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    state::TimerState,
    time::clock::{between, zero_time},
};

/// Timing fields of a timer and the transitions between its [states][TimerState].
///
/// Core never reads the clock itself, every operation gets current time from the caller.
/// Transitions keep `stop_time` set if and only if state is not [`TimerState::Running`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerCore {
    /// Start of the current epoch.
    start_time: DateTime<Utc>,
    /// Duration of the current epoch.
    duration: Duration,
    /// Current state.
    state: TimerState,
    /// Time of stop or observed expiration.
    stop_time: Option<DateTime<Utc>>,
}

impl TimerCore {
    /// Create running timer which started at `start_time`.
    pub fn new(start_time: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start_time,
            duration,
            state: TimerState::Running,
            stop_time: None,
        }
    }

    /// Create timer from restored fields.
    ///
    /// Stop time is dropped for running timer.
    pub fn from_parts(
        start_time: DateTime<Utc>,
        duration: Duration,
        state: TimerState,
        stop_time: Option<DateTime<Utc>>,
    ) -> Self {
        let stop_time = match state {
            TimerState::Running => None,
            _ => stop_time,
        };
        Self {
            start_time,
            duration,
            state,
            stop_time,
        }
    }

    /// Create uninitialized timer: zero start time and zero duration.
    pub fn zeroed() -> Self {
        Self::new(zero_time(), Duration::ZERO)
    }

    /// Returns time when the current epoch began.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns duration of the timer.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns state of the timer.
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Returns time when timer was stopped or observed expired.
    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.stop_time
    }

    /// Returns time passed since start of the epoch.
    ///
    /// For stopped and expired timers it is frozen at the stop time.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match (self.state, self.stop_time) {
            (TimerState::Running, _) => between(self.start_time, now),
            (_, Some(stop_time)) => between(self.start_time, stop_time),
            (_, None) => self.duration,
        }
    }

    /// Returns time left until deadline, zero if timer is not running.
    pub fn left(&self, now: DateTime<Utc>) -> Duration {
        match self.state {
            TimerState::Running => self.duration.saturating_sub(self.elapsed(now)),
            _ => Duration::ZERO,
        }
    }

    /// Returns `true` if timer is running and its deadline has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == TimerState::Running && self.elapsed(now) >= self.duration
    }

    /// Stop running timer.
    /// Returns `true` if transition happened.
    pub fn stop(&mut self, now: DateTime<Utc>) -> bool {
        self.leave_running(TimerState::Stopped, now)
    }

    /// Move timer to [`TimerState::Expired`] if its deadline has passed.
    /// Returns `true` if transition happened.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        self.is_due(now) && self.leave_running(TimerState::Expired, now)
    }

    /// Start new epoch with specified duration.
    pub fn reset(&mut self, now: DateTime<Utc>, duration: Duration) {
        self.start_time = now;
        self.duration = duration;
        self.state = TimerState::Running;
        self.stop_time = None;
    }

    /// Moves running timer to `to`, recording stop time.
    fn leave_running(&mut self, to: TimerState, now: DateTime<Utc>) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.state = to;
        self.stop_time = Some(now);
        true
    }
}

impl Default for TimerCore {
    fn default() -> Self {
        Self::zeroed()
    }
}
