use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use super::TimerCore;
use crate::{state::TimerState, time::clock::shift};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
}

fn at(ms: u64) -> DateTime<Utc> {
    shift(start(), Duration::from_millis(ms))
}

#[test]
fn running_timer_counts_down() {
    let core = TimerCore::new(start(), Duration::from_millis(500));

    assert_eq!(core.state(), TimerState::Running);
    assert_eq!(core.stop_time(), None);
    assert_eq!(core.elapsed(at(200)), Duration::from_millis(200));
    assert_eq!(core.left(at(200)), Duration::from_millis(300));
    assert!(!core.is_due(at(499)));
    assert!(core.is_due(at(500)));
    assert_eq!(core.left(at(800)), Duration::ZERO);
}

#[test]
fn refresh_expires_only_after_deadline() {
    let mut core = TimerCore::new(start(), Duration::from_millis(100));

    assert!(!core.refresh(at(99)));
    assert_eq!(core.state(), TimerState::Running);

    assert!(core.refresh(at(150)));
    assert_eq!(core.state(), TimerState::Expired);
    assert_eq!(core.stop_time(), Some(at(150)));
    assert_eq!(core.elapsed(at(1000)), Duration::from_millis(150));
    assert_eq!(core.left(at(1000)), Duration::ZERO);

    // Idempotent.
    assert!(!core.refresh(at(200)));
    assert_eq!(core.stop_time(), Some(at(150)));
}

#[test]
fn stop_transitions_once() {
    let mut core = TimerCore::new(start(), Duration::from_secs(5));

    assert!(core.stop(at(1000)));
    assert_eq!(core.state(), TimerState::Stopped);
    assert_eq!(core.stop_time(), Some(at(1000)));
    assert_eq!(core.elapsed(at(4000)), Duration::from_secs(1));
    assert_eq!(core.left(at(4000)), Duration::ZERO);

    assert!(!core.stop(at(2000)));
    assert_eq!(core.stop_time(), Some(at(1000)));

    // Stopped timer never expires.
    assert!(!core.refresh(at(10_000)));
    assert_eq!(core.state(), TimerState::Stopped);
}

#[test]
fn reset_starts_new_epoch() {
    let mut core = TimerCore::new(start(), Duration::from_millis(100));
    core.refresh(at(200));

    core.reset(at(300), Duration::from_millis(400));
    assert_eq!(core.state(), TimerState::Running);
    assert_eq!(core.start_time(), at(300));
    assert_eq!(core.duration(), Duration::from_millis(400));
    assert_eq!(core.stop_time(), None);
    assert_eq!(core.left(at(400)), Duration::from_millis(300));
}

#[test]
fn elapsed_without_stop_time_falls_back_to_duration() {
    let core = TimerCore::from_parts(start(), Duration::from_secs(3), TimerState::Expired, None);

    assert_eq!(core.elapsed(at(10)), Duration::from_secs(3));
    assert_eq!(core.left(at(10)), Duration::ZERO);
}

#[test]
fn from_parts_drops_stop_time_of_running_timer() {
    let core = TimerCore::from_parts(
        start(),
        Duration::from_secs(3),
        TimerState::Running,
        Some(at(10)),
    );

    assert_eq!(core.stop_time(), None);
}

#[test]
fn start_in_future_saturates_elapsed() {
    let core = TimerCore::new(at(1000), Duration::ZERO);

    // Negative elapsed time saturates to zero, so zero-length timer is due.
    assert_eq!(core.elapsed(start()), Duration::ZERO);
    assert!(core.is_due(start()));

    let core = TimerCore::new(at(1000), Duration::from_millis(10));
    assert!(!core.is_due(start()));
    assert_eq!(core.left(start()), Duration::from_millis(10));
}

#[test]
fn zeroed_timer_is_due() {
    let mut core = TimerCore::zeroed();

    assert_eq!(core.duration(), Duration::ZERO);
    assert!(core.refresh(start()));
    assert_eq!(core.state(), TimerState::Expired);
}
