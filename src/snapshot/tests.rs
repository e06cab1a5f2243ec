use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{TimeZone, Utc};
use serde_json::Value;

use super::{DecodeError, Snapshot};
use crate::{state::TimerState, time::Clock, Timer, TimerRuntime};

#[test]
fn export_import_round_trip() {
    let (runtime, clock, _) = TimerRuntime::manual();

    let running = Timer::start(Duration::from_secs(30), &runtime);
    let stopped = Timer::start(Duration::from_secs(30), &runtime);
    let expired = Timer::start(Duration::from_secs(1), &runtime);

    clock.advance(Duration::from_millis(1500));
    stopped.stop();
    expired.update_state();
    clock.advance(Duration::from_millis(500));

    for timer in [&running, &stopped, &expired] {
        let snapshot = timer.export();
        let restored = Timer::restore(Some(&snapshot), &runtime);
        assert_eq!(restored.export(), snapshot);
        assert_eq!(restored.start_time(), timer.start_time());
        assert_eq!(restored.duration(), timer.duration());
        assert_eq!(restored.state(), timer.state());
        assert_eq!(restored.stop_time(), timer.stop_time());
    }
}

#[test]
fn import_clears_callback() {
    let (runtime, clock, scheduler) = TimerRuntime::manual();
    let counter = Arc::new(AtomicUsize::new(0));

    let timer = Timer::start(Duration::from_millis(100), &runtime);
    let counter_copy = counter.clone();
    timer.attach_callback(move || {
        counter_copy.fetch_add(1, Ordering::SeqCst);
    });

    let snapshot = Snapshot::running(clock.now(), Duration::from_millis(300));
    timer.import(Some(&snapshot));
    assert!(!timer.has_callback());
    assert_eq!(scheduler.pending(), 0);

    clock.advance(Duration::from_secs(1));
    scheduler.run_due();
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    assert_eq!(timer.state(), TimerState::Expired);
}

#[test]
fn import_resets_executed_flag() {
    let (runtime, clock, scheduler) = TimerRuntime::manual();
    let counter = Arc::new(AtomicUsize::new(0));
    let timer = Timer::start(Duration::from_millis(100), &runtime);

    let counter_copy = counter.clone();
    timer.attach_callback(move || {
        counter_copy.fetch_add(1, Ordering::SeqCst);
    });
    clock.advance(Duration::from_millis(100));
    scheduler.run_due();
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // Restored expired timer fires newly attached callback once.
    timer.import(Some(&timer.export()));
    let counter_copy = counter.clone();
    timer.attach_callback(move || {
        counter_copy.fetch_add(1, Ordering::SeqCst);
    });
    scheduler.run_due();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn snapshot_expired_while_offline_is_expired_on_import() {
    let (runtime, clock, _) = TimerRuntime::manual();
    let start = clock.now() - chrono::Duration::seconds(10);
    let snapshot = Snapshot::running(start, Duration::from_secs(1));

    clock.advance(Duration::from_millis(5));
    let timer = Timer::restore(Some(&snapshot), &runtime);

    assert_eq!(timer.state(), "expired");
    // Observation time, not the original deadline.
    assert_eq!(timer.stop_time(), Some(clock.now()));
    assert_eq!(timer.elapsed(), Duration::from_millis(10_005));
    assert_eq!(timer.left(), Duration::ZERO);
}

#[test]
fn absent_snapshot_imports_uninitialized_timer() {
    let (runtime, clock, _) = TimerRuntime::manual();
    let timer = Timer::start(Duration::from_secs(5), &runtime);

    timer.import(None);

    assert_eq!(timer.duration(), Duration::ZERO);
    assert_eq!(timer.start_time().timestamp(), 0);
    assert_eq!(timer.state(), TimerState::Expired);
    assert_eq!(timer.stop_time(), Some(clock.now()));
}

#[test]
fn text_form_has_stable_fields() {
    let start = Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap();
    let stop = start + chrono::Duration::milliseconds(1250);
    let snapshot = Snapshot::new(
        start,
        Duration::from_millis(1500),
        TimerState::Stopped,
        Some(stop),
    )
    .unwrap();

    let value: Value = serde_json::from_str(&snapshot.to_json()).unwrap();
    assert_eq!(value["start_time"], "2024-05-17T10:00:00Z");
    assert_eq!(value["duration"], 1_500_000_000u64);
    assert_eq!(value["state"], "stopped");
    assert_eq!(value["stop_time"], "2024-05-17T10:00:01.250Z");

    let running = Snapshot::running(start, Duration::from_secs(1));
    let value: Value = serde_json::from_str(&running.to_json()).unwrap();
    assert!(value.get("stop_time").is_none());
}

#[test]
fn text_form_saturates_longest_duration() {
    let start = Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap();

    let longest = Snapshot::running(start, Duration::MAX);
    let value: Value = serde_json::from_str(&longest.to_json()).unwrap();
    assert_eq!(value["duration"], u64::MAX);
    let decoded = Snapshot::from_json(&longest.to_json()).unwrap().unwrap();
    assert_eq!(decoded.duration(), Duration::from_nanos(u64::MAX));

    // Largest encodable duration survives exactly.
    let limit = Snapshot::running(start, Duration::from_nanos(u64::MAX));
    let decoded = Snapshot::from_json(&limit.to_json()).unwrap().unwrap();
    assert_eq!(decoded, limit);
}

#[test]
fn text_form_decodes_exactly() {
    let json = r#"{
        "start_time": "2024-05-17T10:00:00.123456789Z",
        "duration": 2500000000,
        "state": "expired",
        "stop_time": "2024-05-17T12:00:00+02:00"
    }"#;

    let snapshot = Snapshot::from_json(json).unwrap().unwrap();
    assert_eq!(snapshot.duration(), Duration::from_millis(2500));
    assert_eq!(snapshot.state(), TimerState::Expired);
    assert_eq!(
        snapshot.stop_time(),
        Some(Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap())
    );

    let again = Snapshot::from_json(&snapshot.to_json()).unwrap().unwrap();
    assert_eq!(again, snapshot);
}

#[test]
fn null_payload_decodes_to_uninitialized_timer() {
    let (runtime, _, _) = TimerRuntime::manual();

    assert_eq!(Snapshot::from_json("null").unwrap(), None);

    let timer = Timer::from_text("null", &runtime).unwrap();
    assert_eq!(timer.duration(), Duration::ZERO);
    assert!(timer.expired());
}

#[test]
fn malformed_payload_leaves_timer_unmodified() {
    let (runtime, _, _) = TimerRuntime::manual();
    let timer = Timer::start(Duration::from_secs(5), &runtime);
    timer.attach_callback(|| {});
    let before = timer.export();

    let payloads = [
        "",
        "{",
        r#"{"start_time": "yesterday", "duration": 1, "state": "running"}"#,
        r#"{"start_time": "2024-05-17T10:00:00Z", "duration": -1, "state": "running"}"#,
        r#"{"start_time": "2024-05-17T10:00:00Z", "duration": 1, "state": "paused"}"#,
        r#"{"start_time": "2024-05-17T10:00:00Z", "state": "running"}"#,
    ];
    for payload in payloads {
        assert!(matches!(
            timer.decode(payload),
            Err(DecodeError::Malformed(_))
        ));
    }

    let inconsistent = [
        (
            r#"{"start_time": "2024-05-17T10:00:00Z", "duration": 1, "state": "stopped"}"#,
            "stop time is missing for stopped timer",
        ),
        (
            r#"{"start_time": "2024-05-17T10:00:00Z", "duration": 1, "state": "running", "stop_time": "2024-05-17T10:00:00Z"}"#,
            "stop time is set for running timer",
        ),
    ];
    for (payload, message) in inconsistent {
        let err = timer.decode(payload).unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    assert_eq!(timer.export(), before);
    assert!(timer.has_callback());
}

#[test]
fn encode_decode_moves_timer_between_runtimes() {
    let (first, clock, _) = TimerRuntime::manual();
    let timer = Timer::start(Duration::from_secs(10), &first);
    clock.advance(Duration::from_secs(3));
    let text = timer.encode();
    drop(timer);

    let (second, other_clock, scheduler) = TimerRuntime::manual();
    other_clock.set(clock.now());
    let restored = Timer::from_text(&text, &second).unwrap();
    assert_eq!(restored.left(), Duration::from_secs(7));

    let counter = Arc::new(AtomicUsize::new(0));
    let counter_copy = counter.clone();
    restored.attach_callback(move || {
        counter_copy.fetch_add(1, Ordering::SeqCst);
    });

    other_clock.advance(Duration::from_secs(7));
    scheduler.run_due();
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // Decoding into live timer replaces its state.
    restored.decode(&text).unwrap();
    assert!(restored.expired());
    assert!(!restored.has_callback());
}
