//! Definition of decoding errors.

use crate::state::TimerState;

/// Represents errors which appear when decoding durable timer payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload is not valid JSON, misses required fields or has values of wrong type.
    #[error("malformed timer payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Stop time is present, but timer is running.
    #[error("stop time is set for running timer")]
    UnexpectedStopTime,
    /// Stop time is absent, but timer is stopped or expired.
    #[error("stop time is missing for {0} timer")]
    MissingStopTime(TimerState),
}
