//! Definition of [`ManualScheduler`], a cooperative scheduler polled by an event loop.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};

use super::{
    clock::{shift, Clock},
    scheduler::{run_guarded, Action, Scheduler, TriggerHandle},
};

/// Actions waiting to run.
#[derive(Default)]
struct Queue {
    /// Armed triggers ordered by deadline, then by arming order.
    armed: BTreeMap<(DateTime<Utc>, u64), Action>,
    /// Deadline of every armed trigger by id.
    deadlines: HashMap<u64, DateTime<Utc>>,
    /// Dispatched actions in dispatch order.
    ready: VecDeque<Action>,
    /// Id of the next armed trigger.
    next_id: u64,
}

/// Scheduler without background threads.
///
/// Nothing runs until the owner calls [`run_due`][ManualScheduler::run_due],
/// which executes dispatched actions and every trigger whose deadline has passed
/// according to the scheduler's [clock][Clock].
pub struct ManualScheduler {
    /// Clock which decides whether triggers are due.
    clock: Arc<dyn Clock>,
    /// Armed triggers and dispatched actions.
    queue: Mutex<Queue>,
}

impl ManualScheduler {
    /// Create scheduler which measures deadlines by specified clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            queue: Mutex::default(),
        }
    }

    /// Run all dispatched actions and all triggers which are due.
    /// Actions armed or dispatched while running are also executed if they are due.
    /// Returns number of executed actions.
    pub fn run_due(&self) -> usize {
        let mut executed = 0;
        while let Some(action) = self.next_due() {
            run_guarded(action);
            executed += 1;
        }
        executed
    }

    /// Returns number of armed triggers and dispatched actions which have not run yet.
    pub fn pending(&self) -> usize {
        let queue = self.lock();
        queue.armed.len() + queue.ready.len()
    }

    /// Returns the earliest deadline among armed triggers.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.lock()
            .armed
            .keys()
            .next()
            .map(|(deadline, _)| *deadline)
    }

    /// Takes next action to run, releasing the lock before it runs.
    fn next_due(&self) -> Option<Action> {
        let now = self.clock.now();
        let mut queue = self.lock();
        if let Some(action) = queue.ready.pop_front() {
            return Some(action);
        }
        let (deadline, id) = *queue.armed.keys().next()?;
        if deadline > now {
            return None;
        }
        queue.deadlines.remove(&id);
        queue.armed.remove(&(deadline, id))
    }

    /// Locks queue, ignoring poisoning.
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn arm(&self, delay: Duration, action: Action) -> TriggerHandle {
        let deadline = shift(self.clock.now(), delay);
        let mut queue = self.lock();
        let id = queue.next_id;
        queue.next_id += 1;
        queue.deadlines.insert(id, deadline);
        queue.armed.insert((deadline, id), action);
        TriggerHandle::new(id)
    }

    fn cancel(&self, handle: TriggerHandle) {
        let mut queue = self.lock();
        if let Some(deadline) = queue.deadlines.remove(&handle.id()) {
            queue.armed.remove(&(deadline, handle.id()));
        }
    }

    fn dispatch(&self, action: Action) {
        self.lock().ready.push_back(action);
    }
}
