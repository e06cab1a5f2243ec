//! Definition of [`TimerSettings`], the base intervals of signaling transaction timers.

use std::{fmt, fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

/// Represents errors which appear when loading [`TimerSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file can not be read.
    #[error("can not read timer settings: {0}")]
    Io(#[from] std::io::Error),
    /// Settings are not valid JSON or contain invalid values.
    #[error("can not parse timer settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Standard transaction timers of the signaling protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// INVITE request retransmit interval (client).
    A,
    /// INVITE transaction timeout (client).
    B,
    /// Wait time for response retransmits (client).
    D,
    /// Non-INVITE request retransmit interval (client).
    E,
    /// Non-INVITE transaction timeout (client).
    F,
    /// INVITE response retransmit interval (server).
    G,
    /// Wait time for ACK receipt (server).
    H,
    /// Wait time for ACK retransmits (server).
    I,
    /// Wait time for non-INVITE request retransmits (server).
    J,
    /// Wait time for response retransmits (client).
    K,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Base intervals, from which standard transaction timer durations are derived.
///
/// In JSON every interval is a count of milliseconds; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    /// Round-trip time estimate.
    #[serde(with = "millis")]
    pub t1: Duration,
    /// Maximum retransmit interval.
    #[serde(with = "millis")]
    pub t2: Duration,
    /// Maximum duration a message remains in the network.
    #[serde(with = "millis")]
    pub t4: Duration,
    /// Delay used to arm trigger when the deadline has already passed.
    #[serde(with = "millis")]
    pub min_rearm_delay: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            t1: Duration::from_millis(500),
            t2: Duration::from_secs(4),
            t4: Duration::from_secs(5),
            min_rearm_delay: Duration::from_millis(1),
        }
    }
}

impl TimerSettings {
    /// Parse settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Returns initial duration of the standard timer.
    /// Waiting timers collapse to zero on reliable transports.
    pub fn duration_for(&self, kind: TimerKind, reliable: bool) -> Duration {
        let transaction_timeout = self.t1.saturating_mul(64);
        match kind {
            TimerKind::A | TimerKind::E | TimerKind::G => self.t1,
            TimerKind::B | TimerKind::F | TimerKind::H => transaction_timeout,
            TimerKind::D if reliable => Duration::ZERO,
            TimerKind::D => Duration::from_secs(32).max(transaction_timeout),
            TimerKind::J if reliable => Duration::ZERO,
            TimerKind::J => transaction_timeout,
            TimerKind::I | TimerKind::K if reliable => Duration::ZERO,
            TimerKind::I | TimerKind::K => self.t4,
        }
    }

    /// Returns retransmit interval following `current`:
    /// doubled and capped by [`t2`][TimerSettings::t2].
    pub fn next_retransmit(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.t2)
    }
}

/// Serde adapter for durations stored as millisecond counts.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Writes duration as whole milliseconds, saturating at `u64::MAX`.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    /// Reads duration from milliseconds.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{TimerKind, TimerSettings};

    #[test]
    fn defaults_follow_protocol() {
        let settings = TimerSettings::default();
        assert_eq!(settings.t1, Duration::from_millis(500));

        assert_eq!(settings.duration_for(TimerKind::A, false), Duration::from_millis(500));
        assert_eq!(settings.duration_for(TimerKind::B, false), Duration::from_secs(32));
        assert_eq!(settings.duration_for(TimerKind::D, false), Duration::from_secs(32));
        assert_eq!(settings.duration_for(TimerKind::D, true), Duration::ZERO);
        assert_eq!(settings.duration_for(TimerKind::K, false), Duration::from_secs(5));
        assert_eq!(settings.duration_for(TimerKind::J, true), Duration::ZERO);
        assert_eq!(settings.duration_for(TimerKind::H, true), Duration::from_secs(32));
    }

    #[test]
    fn retransmit_interval_is_capped() {
        let settings = TimerSettings::default();

        assert_eq!(settings.next_retransmit(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(settings.next_retransmit(Duration::from_secs(3)), Duration::from_secs(4));
    }

    #[test]
    fn partial_json_takes_defaults() {
        let settings = TimerSettings::from_json(r#"{"t1": 100}"#).unwrap();

        assert_eq!(settings.t1, Duration::from_millis(100));
        assert_eq!(settings.t2, Duration::from_secs(4));
        assert_eq!(settings.duration_for(TimerKind::F, false), Duration::from_millis(6400));
    }

    #[test]
    fn bad_json_is_rejected() {
        assert!(TimerSettings::from_json(r#"{"t1": -5}"#).is_err());
        assert!(TimerSettings::load("/definitely/not/here.json").is_err());
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = TimerSettings {
            t1: Duration::from_millis(250),
            ..TimerSettings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(TimerSettings::from_json(&json).unwrap(), settings);
    }
}
