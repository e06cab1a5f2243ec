//! Definition of [`TokioScheduler`], which arms triggers as tokio tasks.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use tokio::{
    runtime::{Handle, TryCurrentError},
    task::JoinHandle,
    time::sleep,
};

use super::scheduler::{run_guarded, Action, Scheduler, TriggerHandle};

/// Tasks of armed triggers by id.
type PendingTasks = Arc<Mutex<HashMap<u64, JoinHandle<()>>>>;

/// Responsible for setting and cancelling triggers on the tokio runtime.
/// Each trigger is a task which sleeps and then runs the action.
pub struct TokioScheduler {
    /// Runtime which runs trigger tasks.
    runtime: Handle,
    /// Tasks which have not fired yet.
    pending: PendingTasks,
    /// Id of the next armed trigger.
    next_id: AtomicU64,
}

impl TokioScheduler {
    /// Create scheduler spawning tasks on specified runtime.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: Arc::default(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Create scheduler on the runtime of the current context.
    pub fn current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// Returns number of triggers which are armed but not fired yet.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Cancel all pending triggers.
    pub fn cancel_all(&self) {
        let mut pending = lock(&self.pending);
        for (_, task) in pending.drain() {
            task.abort();
        }
    }
}

impl Scheduler for TokioScheduler {
    fn arm(&self, delay: Duration, action: Action) -> TriggerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pending = self.pending.clone();

        // Lock is held until the task is registered, so the task can not miss its entry.
        let mut locked = lock(&self.pending);
        let task = self.runtime.spawn(async move {
            sleep(delay).await;
            // Entry is absent if trigger was canceled after sleep completed.
            let armed = lock(&pending).remove(&id).is_some();
            if armed {
                run_guarded(action);
            }
        });
        locked.insert(id, task);

        TriggerHandle::new(id)
    }

    fn cancel(&self, handle: TriggerHandle) {
        if let Some(task) = lock(&self.pending).remove(&handle.id()) {
            task.abort();
        }
    }

    fn dispatch(&self, action: Action) {
        self.runtime.spawn(async move { run_guarded(action) });
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Locks pending tasks, ignoring poisoning.
fn lock(pending: &PendingTasks) -> std::sync::MutexGuard<'_, HashMap<u64, JoinHandle<()>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
