//! Definition of [`TimerState`] and its textual names.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Represents state of the timer.
///
/// Timer starts in [`TimerState::Running`] and leaves it exactly once per epoch,
/// either by explicit [stop][crate::Timer::stop] or by expiration.
/// Both terminal states are left only by [reset][crate::Timer::reset].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Timer is counting down.
    #[default]
    Running,
    /// Timer was stopped before its deadline.
    Stopped,
    /// Timer reached its deadline.
    Expired,
}

impl TimerState {
    /// Returns stable lowercase name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Running => "running",
            TimerState::Stopped => "stopped",
            TimerState::Expired => "expired",
        }
    }

    /// Returns `true` if the state can only be left by reset.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TimerState::Running)
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing unknown state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown timer state: {0:?}")]
pub struct UnknownState(pub String);

impl FromStr for TimerState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(TimerState::Running),
            "stopped" => Ok(TimerState::Stopped),
            "expired" => Ok(TimerState::Expired),
            other => Err(UnknownState(other.to_owned())),
        }
    }
}

impl PartialEq<&str> for TimerState {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::TimerState;

    #[test]
    fn names_are_stable() {
        for state in [TimerState::Running, TimerState::Stopped, TimerState::Expired] {
            assert_eq!(state.as_str().parse::<TimerState>().unwrap(), state);
            assert_eq!(state.to_string(), state.as_str());
        }
        assert!("paused".parse::<TimerState>().is_err());
        assert_eq!(TimerState::Expired, "expired");
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&TimerState::Stopped).unwrap();
        assert_eq!(json, "\"stopped\"");
        let state: TimerState = serde_json::from_str("\"expired\"").unwrap();
        assert_eq!(state, TimerState::Expired);
    }
}
