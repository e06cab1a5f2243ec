//! Definition of [`Snapshot`] and its JSON form.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::{machine::TimerCore, state::TimerState};

use super::error::DecodeError;

/// Immutable durable state of a timer.
///
/// Holds only timing fields. Callbacks and armed triggers are never persisted,
/// so restored timer needs its callback to be attached again.
///
/// JSON form:
/// * `start_time` - RFC 3339 timestamp.
/// * `duration` - count of nanoseconds. Durations longer than `u64::MAX` nanoseconds
///   (about 584 years) are written as `u64::MAX`.
/// * `state` - one of `"running"`, `"stopped"`, `"expired"`.
/// * `stop_time` - RFC 3339 timestamp, omitted for running timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Start of the timer's epoch.
    start_time: DateTime<Utc>,
    /// Duration of the timer.
    duration: Duration,
    /// State of the timer.
    state: TimerState,
    /// Time of stop or observed expiration.
    stop_time: Option<DateTime<Utc>>,
}

/// Wire layout of [`Snapshot`].
#[derive(Serialize, Deserialize)]
struct WireSnapshot {
    /// RFC 3339 start time.
    #[serde(serialize_with = "timestamp")]
    start_time: DateTime<Utc>,
    /// Count of nanoseconds.
    duration: u64,
    /// Lowercase state name.
    state: TimerState,
    /// RFC 3339 stop time, omitted for running timer.
    #[serde(
        default,
        serialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    stop_time: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Create snapshot of timer, which is running since `start_time`.
    pub fn running(start_time: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start_time,
            duration,
            state: TimerState::Running,
            stop_time: None,
        }
    }

    /// Create snapshot from all fields.
    /// Stop time must be set if and only if state is not [`TimerState::Running`].
    pub fn new(
        start_time: DateTime<Utc>,
        duration: Duration,
        state: TimerState,
        stop_time: Option<DateTime<Utc>>,
    ) -> Result<Self, DecodeError> {
        match (state, stop_time) {
            (TimerState::Running, Some(_)) => Err(DecodeError::UnexpectedStopTime),
            (TimerState::Stopped | TimerState::Expired, None) => {
                Err(DecodeError::MissingStopTime(state))
            }
            _ => Ok(Self {
                start_time,
                duration,
                state,
                stop_time,
            }),
        }
    }

    /// Returns time when the timer's epoch began.
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

    /// Returns time when the timer was stopped or observed expired.
    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.stop_time
    }

    /// Encode snapshot as JSON.
    ///
    /// Duration is saturated at `u64::MAX` nanoseconds,
    /// so longer durations do not survive the round trip exactly.
    pub fn to_json(&self) -> String {
        let wire = WireSnapshot {
            start_time: self.start_time,
            duration: u64::try_from(self.duration.as_nanos()).unwrap_or(u64::MAX),
            state: self.state,
            stop_time: self.stop_time,
        };
        // Serializing plain fields into a string does not fail.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Decode snapshot from JSON.
    /// JSON `null` decodes into [`None`], which stands for uninitialized timer.
    pub fn from_json(json: &str) -> Result<Option<Self>, DecodeError> {
        let wire: Option<WireSnapshot> = serde_json::from_str(json)?;
        wire.map(|wire| {
            Self::new(
                wire.start_time,
                Duration::from_nanos(wire.duration),
                wire.state,
                wire.stop_time,
            )
        })
        .transpose()
    }

    /// Returns snapshot of timer's state.
    pub(crate) fn from_core(core: &TimerCore) -> Self {
        Self {
            start_time: core.start_time(),
            duration: core.duration(),
            state: core.state(),
            stop_time: core.stop_time(),
        }
    }

    /// Returns timer's state described by the snapshot.
    pub(crate) fn to_core(&self) -> TimerCore {
        TimerCore::from_parts(self.start_time, self.duration, self.state, self.stop_time)
    }
}

/// Writes time in RFC 3339 form with `Z` suffix and only significant fraction digits.
fn timestamp<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Writes optional time as [`timestamp`] or `null`.
fn optional_timestamp<S: Serializer>(
    at: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => timestamp(at, serializer),
        None => serializer.serialize_none(),
    }
}
