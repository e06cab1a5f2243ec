//! Definition of [`TimerQuery`], read access which also works for absent timers.

use std::{borrow::Borrow, time::Duration};

use chrono::{DateTime, Utc};

use crate::{state::TimerState, time::clock::zero_time};

use super::timer::Timer;

/// Read-only view of a timer.
///
/// Implemented for `Option` of timer references, so an absent timer answers
/// with well-defined zero values: zero start time and duration, no stop time,
/// nothing elapsed or left, and [`TimerState::Stopped`], since it can never fire.
pub trait TimerQuery {
    /// Returns state of the timer.
    fn state(&self) -> TimerState;

    /// Returns time when the current epoch began.
    fn start_time(&self) -> DateTime<Utc>;

    /// Returns duration of the current epoch.
    fn duration(&self) -> Duration;

    /// Returns time when timer was stopped or observed expired.
    fn stop_time(&self) -> Option<DateTime<Utc>>;

    /// Returns time passed since the epoch began.
    fn elapsed(&self) -> Duration;

    /// Returns time left until deadline.
    fn left(&self) -> Duration;

    /// Returns `true` if timer has expired.
    fn expired(&self) -> bool {
        self.state() == TimerState::Expired
    }
}

impl TimerQuery for Timer {
    fn state(&self) -> TimerState {
        Timer::state(self)
    }

    fn start_time(&self) -> DateTime<Utc> {
        Timer::start_time(self)
    }

    fn duration(&self) -> Duration {
        Timer::duration(self)
    }

    fn stop_time(&self) -> Option<DateTime<Utc>> {
        Timer::stop_time(self)
    }

    fn elapsed(&self) -> Duration {
        Timer::elapsed(self)
    }

    fn left(&self) -> Duration {
        Timer::left(self)
    }
}

impl<T: Borrow<Timer>> TimerQuery for Option<T> {
    fn state(&self) -> TimerState {
        present(self).map_or(TimerState::Stopped, |timer| timer.state())
    }

    fn start_time(&self) -> DateTime<Utc> {
        present(self).map_or_else(zero_time, |timer| timer.start_time())
    }

    fn duration(&self) -> Duration {
        present(self).map_or(Duration::ZERO, |timer| timer.duration())
    }

    fn stop_time(&self) -> Option<DateTime<Utc>> {
        present(self).and_then(|timer| timer.stop_time())
    }

    fn elapsed(&self) -> Duration {
        present(self).map_or(Duration::ZERO, |timer| timer.elapsed())
    }

    fn left(&self) -> Duration {
        present(self).map_or(Duration::ZERO, |timer| timer.left())
    }
}

/// Returns timer behind the option, if present.
fn present<T: Borrow<Timer>>(timer: &Option<T>) -> Option<&Timer> {
    timer.as_ref().map(<T as Borrow<Timer>>::borrow)
}
