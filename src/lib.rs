//! Durable timers for session-oriented protocol stacks.
//!
//! [`Timer`] can be [exported][Timer::export] into a [`Snapshot`], persisted by the caller
//! and [restored][Timer::restore] later, possibly after the process was offline.
//! Attached callback runs exactly once per epoch, no matter whether the expiration was observed
//! by a background trigger, by an explicit [state check][Timer::update_state]
//! or by attaching callback after the deadline.
//!
//! Timers consume two capabilities, wall [`Clock`] and cancelable one-shot [`Scheduler`],
//! bundled into [`TimerRuntime`].

// Add warnings for missing public and private documentation.
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

pub mod live;
pub mod machine;
pub mod settings;
pub mod snapshot;
pub mod state;
pub mod time;

pub use live::{Callback, Timer, TimerQuery, TimerRuntime};
pub use settings::{SettingsError, TimerKind, TimerSettings};
pub use snapshot::{DecodeError, Snapshot};
pub use state::TimerState;
pub use time::{
    Clock, ManualClock, ManualScheduler, Scheduler, SystemClock, ThreadScheduler, TokioScheduler,
    TriggerHandle,
};
