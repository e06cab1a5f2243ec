//! Definition of [`ThreadScheduler`], which arms triggers on a [`timer::Timer`] thread.

use std::{
    collections::HashMap,
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc::{channel, Sender},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

use timer::{Guard, Timer};

use super::scheduler::{run_guarded, Action, Scheduler, TriggerHandle};

/// Guards of armed triggers by id. Dropping a guard cancels its trigger.
type Guards = Arc<Mutex<HashMap<u64, Guard>>>;

/// Request for the dispatcher thread.
/// Fired triggers carry their id, dispatched actions carry none.
type Job = (Option<u64>, Action);

/// Longest delay handed to the scheduling thread, about a century.
/// Longer triggers fire at this bound, timers rearm them for the remaining time.
const MAX_DELAY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Thread-based scheduler, which does not require async runtime.
///
/// Triggers are armed on the [`timer`] crate's scheduling thread.
/// Fired actions are forwarded to a separate dispatcher thread,
/// so user code never occupies the scheduling thread.
///
/// Delays longer than about a century are shortened to it.
pub struct ThreadScheduler {
    /// Scheduling thread of the [`timer`] crate.
    timer: Mutex<Timer>,
    /// Guards of triggers which have not fired yet.
    guards: Guards,
    /// Queue of the dispatcher thread.
    jobs: Mutex<Sender<Job>>,
    /// Id of the next armed trigger.
    next_id: AtomicU64,
}

impl ThreadScheduler {
    /// Create scheduler and spawn its dispatcher thread.
    pub fn new() -> io::Result<Self> {
        let (jobs, receiver) = channel::<Job>();
        let guards = Guards::default();
        let guards_copy = guards.clone();

        thread::Builder::new()
            .name("timer-dispatch".to_owned())
            .spawn(move || {
                for (id, action) in receiver {
                    if let Some(id) = id {
                        // Trigger canceled after its guard already fired.
                        if lock(&guards_copy).remove(&id).is_none() {
                            continue;
                        }
                    }
                    run_guarded(action);
                }
            })?;

        Ok(Self {
            timer: Mutex::new(Timer::new()),
            guards,
            jobs: Mutex::new(jobs),
            next_id: AtomicU64::new(0),
        })
    }

    /// Returns number of triggers which are armed but not fired yet.
    pub fn pending(&self) -> usize {
        lock(&self.guards).len()
    }

    /// Pass job to the dispatcher thread.
    fn send(&self, job: Job) {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.send(job).is_err() {
            log::warn!("Timer dispatcher thread is gone, action dropped");
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn arm(&self, delay: Duration, action: Action) -> TriggerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let delay_wrapper = delay_wrapper(delay);

        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let mut action = Some(action);

        let mut guards = lock(&self.guards);
        let guard = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .schedule_with_delay(delay_wrapper, move || {
                if let Some(action) = action.take() {
                    // Send error means scheduler has been dropped, which is normal behavior.
                    let _ = jobs.send((Some(id), action));
                }
            });
        guards.insert(id, guard);

        TriggerHandle::new(id)
    }

    fn cancel(&self, handle: TriggerHandle) {
        // Dropping guard cancels scheduled execution.
        lock(&self.guards).remove(&handle.id());
    }

    fn dispatch(&self, action: Action) {
        self.send((None, action));
    }
}

/// Converts delay for the scheduling thread, which adds it to the current time.
fn delay_wrapper(delay: Duration) -> chrono::Duration {
    let delay = delay.min(MAX_DELAY);
    // Bounded by MAX_DELAY, so the cast does not overflow.
    chrono::Duration::seconds(delay.as_secs() as i64)
        + chrono::Duration::nanoseconds(i64::from(delay.subsec_nanos()))
}

/// Locks guards, ignoring poisoning.
fn lock(guards: &Guards) -> std::sync::MutexGuard<'_, HashMap<u64, Guard>> {
    guards.lock().unwrap_or_else(PoisonError::into_inner)
}
