//! Definition of [`Timer`].

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::{machine::TimerCore, settings::TimerKind, state::TimerState, time::TriggerHandle};

use super::runtime::TimerRuntime;

/// Action invoked when timer expires.
pub type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Trigger armed for the current epoch.
struct Armed {
    /// Distinguishes fires of this trigger from stale ones.
    seq: u64,
    /// Handle for canceling the trigger.
    handle: TriggerHandle,
}

/// Mutable state of the timer, guarded by single lock.
struct Slot {
    /// Timing fields and state.
    core: TimerCore,
    /// Attached callback, if any.
    callback: Option<Callback>,
    /// Set once callback is claimed in the current epoch.
    callback_executed: bool,
    /// Trigger armed for the current epoch.
    trigger: Option<Armed>,
    /// Last sequence number given to a trigger.
    next_seq: u64,
}

impl Slot {
    /// Marks callback executed and returns it, if it has not run in this epoch.
    fn claim_callback(&mut self) -> Option<Callback> {
        if self.callback_executed {
            return None;
        }
        let callback = self.callback.clone()?;
        self.callback_executed = true;
        Some(callback)
    }
}

/// Part of the timer reachable from its triggers.
struct Shared {
    /// Lock over all mutable state.
    slot: Mutex<Slot>,
    /// Clock, scheduler and settings of the timer.
    runtime: TimerRuntime,
}

impl Shared {
    /// Locks the slot, ignoring poisoning.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns current time of the runtime's clock.
    fn now(&self) -> DateTime<Utc> {
        self.runtime.clock().now()
    }

    /// Expires timer if its deadline has passed.
    /// Returns callback, which caller must dispatch after releasing the lock.
    fn refresh(&self, slot: &mut Slot, now: DateTime<Utc>) -> Option<Callback> {
        if !slot.core.refresh(now) {
            return None;
        }
        log::debug!("Timer observed expired at {}", now);
        self.disarm(slot);
        slot.claim_callback()
    }

    /// Cancels armed trigger, if any.
    fn disarm(&self, slot: &mut Slot) {
        if let Some(armed) = slot.trigger.take() {
            self.runtime.scheduler().cancel(armed.handle);
            log::trace!("Canceled trigger {:?}", armed.handle);
        }
    }

    /// Hands callback to the scheduler. Must be called without the lock.
    fn dispatch(&self, callback: Option<Callback>) {
        if let Some(callback) = callback {
            self.runtime
                .scheduler()
                .dispatch(Box::new(move || callback()));
        }
    }
}

/// Arms trigger for the current epoch, replacing previous one.
fn arm(shared: &Arc<Shared>, slot: &mut Slot, delay: Duration) {
    shared.disarm(slot);

    let delay = delay.max(shared.runtime.min_delay());
    slot.next_seq += 1;
    let seq = slot.next_seq;

    // Trigger must not keep dropped timer alive.
    let weak = Arc::downgrade(shared);
    let handle = shared.runtime.scheduler().arm(
        delay,
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                on_fire(&shared, seq);
            }
        }),
    );
    log::trace!("Armed trigger {:?} in {:?}", handle, delay);

    slot.trigger = Some(Armed { seq, handle });
}

/// Handles background trigger. Runs on the scheduler's execution context.
fn on_fire(shared: &Arc<Shared>, seq: u64) {
    let callback = {
        let mut slot = shared.lock();

        if slot.trigger.as_ref().map(|armed| armed.seq) != Some(seq) {
            log::debug!("Ignored stale trigger");
            return;
        }
        slot.trigger = None;

        if slot.core.state() != TimerState::Running || slot.callback_executed {
            return;
        }

        let now = shared.now();
        if !slot.core.is_due(now) {
            // Scheduler measures delays by its own clock, which may run ahead of the wall clock.
            let left = slot.core.left(now);
            log::debug!("Trigger fired {:?} before deadline, rearming", left);
            arm(shared, &mut slot, left);
            return;
        }

        slot.core.refresh(now);
        log::debug!("Timer expired at {}", now);
        slot.claim_callback()
    };

    if let Some(callback) = callback {
        callback();
    }
}

/// Thread-safe timer which survives serialization.
///
/// Timer invokes attached [callback][Timer::attach_callback] at most once per epoch,
/// no matter which of background trigger, [explicit refresh][Timer::update_state]
/// or late callback attachment observes the expiration first.
/// Callback never runs on the caller's path and never under the timer's lock.
///
/// Dropping the timer cancels its armed trigger.
pub struct Timer {
    /// State shared with armed triggers.
    shared: Arc<Shared>,
}

impl Timer {
    /// Create timer starting now.
    pub fn start(duration: Duration, runtime: &TimerRuntime) -> Self {
        let now = runtime.clock().now();
        Self::start_at(now, duration, runtime)
    }

    /// Create timer which started at specified time, which may be in the past or in the future.
    pub fn start_at(start_time: DateTime<Utc>, duration: Duration, runtime: &TimerRuntime) -> Self {
        Self::from_core(TimerCore::new(start_time, duration), runtime)
    }

    /// Create standard transaction timer starting now.
    /// Duration is taken from the runtime's [settings][crate::TimerSettings].
    pub fn start_standard(kind: TimerKind, reliable: bool, runtime: &TimerRuntime) -> Self {
        let duration = runtime.settings().duration_for(kind, reliable);
        log::debug!("Starting timer {} for {:?}", kind, duration);
        Self::start(duration, runtime)
    }

    /// Create timer with given timing fields and no callback.
    pub(crate) fn from_core(core: TimerCore, runtime: &TimerRuntime) -> Self {
        let slot = Slot {
            core,
            callback: None,
            callback_executed: false,
            trigger: None,
            next_seq: 0,
        };
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(slot),
                runtime: runtime.clone(),
            }),
        }
    }

    /// Returns runtime of the timer.
    pub fn runtime(&self) -> &TimerRuntime {
        &self.shared.runtime
    }

    /// Stop running timer, clearing its callback.
    /// Returns `true` if timer was running.
    pub fn stop(&self) -> bool {
        let mut slot = self.shared.lock();
        let now = self.shared.now();

        self.shared.disarm(&mut slot);
        slot.callback = None;

        let stopped = slot.core.stop(now);
        if stopped {
            log::debug!("Timer stopped at {}", now);
        }
        stopped
    }

    /// Start new epoch with specified duration.
    /// Attached callback is kept and armed again.
    pub fn reset(&self, duration: Duration) {
        let mut slot = self.shared.lock();
        let now = self.shared.now();

        self.shared.disarm(&mut slot);
        slot.core.reset(now, duration);
        slot.callback_executed = false;
        log::debug!("Timer reset for {:?}", duration);

        if slot.callback.is_some() {
            arm(&self.shared, &mut slot, duration);
        }
    }

    /// Attach callback, replacing previous one.
    ///
    /// If timer has already expired and no callback ran in this epoch,
    /// callback is dispatched immediately.
    pub fn attach_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.attach(Arc::new(callback));
    }

    /// Attach shared callback, replacing previous one.
    pub fn attach(&self, callback: Callback) {
        let dispatch = {
            let mut slot = self.shared.lock();
            let now = self.shared.now();
            slot.callback = Some(callback);

            match slot.core.state() {
                TimerState::Expired => slot.claim_callback(),
                TimerState::Running => {
                    let left = slot.core.left(now);
                    arm(&self.shared, &mut slot, left);
                    None
                }
                TimerState::Stopped => None,
            }
        };
        self.shared.dispatch(dispatch);
    }

    /// Returns `true` if callback is attached.
    pub fn has_callback(&self) -> bool {
        self.shared.lock().callback.is_some()
    }

    /// Expire timer if its deadline has passed.
    /// Returns resulting state.
    pub fn update_state(&self) -> TimerState {
        self.observe(|core, _| core.state())
    }

    /// Returns state of the timer.
    pub fn state(&self) -> TimerState {
        self.update_state()
    }

    /// Returns time when the current epoch began.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.shared.lock().core.start_time()
    }

    /// Returns duration of the current epoch.
    pub fn duration(&self) -> Duration {
        self.shared.lock().core.duration()
    }

    /// Returns time when timer was stopped or observed expired.
    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.observe(|core, _| core.stop_time())
    }

    /// Returns time passed since the epoch began.
    pub fn elapsed(&self) -> Duration {
        self.observe(|core, now| core.elapsed(now))
    }

    /// Returns time left until deadline.
    pub fn left(&self) -> Duration {
        self.observe(|core, now| core.left(now))
    }

    /// Returns `true` if timer has expired.
    pub fn expired(&self) -> bool {
        self.state() == TimerState::Expired
    }

    /// Refreshes state and reads the core under lock.
    pub(crate) fn observe<R>(&self, read: impl FnOnce(&TimerCore, DateTime<Utc>) -> R) -> R {
        let (result, dispatch) = {
            let mut slot = self.shared.lock();
            let now = self.shared.now();
            let dispatch = self.shared.refresh(&mut slot, now);
            (read(&slot.core, now), dispatch)
        };
        self.shared.dispatch(dispatch);
        result
    }

    /// Replaces timing fields, dropping callback and armed trigger.
    pub(crate) fn replace_core(&self, core: TimerCore) {
        let dispatch = {
            let mut slot = self.shared.lock();
            let now = self.shared.now();

            self.shared.disarm(&mut slot);
            slot.core = core;
            slot.callback = None;
            slot.callback_executed = false;

            self.shared.refresh(&mut slot, now)
        };
        self.shared.dispatch(dispatch);
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let mut slot = self.shared.lock();
        self.shared.disarm(&mut slot);
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.shared.lock();
        f.debug_struct("Timer")
            .field("start_time", &slot.core.start_time())
            .field("duration", &slot.core.duration())
            .field("state", &slot.core.state())
            .field("stop_time", &slot.core.stop_time())
            .field("has_callback", &slot.callback.is_some())
            .finish()
    }
}
