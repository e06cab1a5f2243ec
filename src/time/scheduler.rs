//! Definition of the [`Scheduler`] trait, which is used by [timers][crate::Timer]
//! to arm one-shot background triggers and to run callbacks outside of the caller's path.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    time::Duration,
};

/// Work passed to a [`Scheduler`].
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Opaque reference to an armed trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerHandle(u64);

impl TriggerHandle {
    /// Create handle from scheduler-specific id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns scheduler-specific id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Cancelable one-shot delayed invocation facility.
///
/// Implementations must guarantee that once [`cancel`][Scheduler::cancel] returns,
/// the canceled action does not start.
/// Neither [`arm`][Scheduler::arm] nor [`dispatch`][Scheduler::dispatch] may run
/// the action on the calling thread before returning.
pub trait Scheduler: Send + Sync {
    /// Run `action` once after `delay`.
    fn arm(&self, delay: Duration, action: Action) -> TriggerHandle;

    /// Cancel armed trigger.
    /// If trigger already fired or was canceled, does nothing.
    fn cancel(&self, handle: TriggerHandle);

    /// Run `action` as soon as possible on a separate execution context.
    fn dispatch(&self, action: Action);
}

/// Run action, confining panic to the current execution context.
pub(crate) fn run_guarded(action: Action) {
    if catch_unwind(AssertUnwindSafe(action)).is_err() {
        log::error!("Timer action panicked");
    }
}
