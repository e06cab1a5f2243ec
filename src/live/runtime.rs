//! Definition of [`TimerRuntime`], the environment timers live in.

use std::{sync::Arc, time::Duration};

use tokio::runtime::TryCurrentError;

use crate::{
    settings::TimerSettings,
    time::{Clock, ManualClock, ManualScheduler, Scheduler, SystemClock, ThreadScheduler, TokioScheduler},
};

/// Clock, scheduler and settings shared by timers.
/// Cloning is cheap, all clones refer to the same clock and scheduler.
#[derive(Clone)]
pub struct TimerRuntime {
    /// Source of current time.
    clock: Arc<dyn Clock>,
    /// Arms triggers and runs callbacks.
    scheduler: Arc<dyn Scheduler>,
    /// Base intervals of standard timers.
    settings: TimerSettings,
}

impl TimerRuntime {
    /// Create runtime from specified clock and scheduler with default settings.
    pub fn new(clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            clock,
            scheduler,
            settings: TimerSettings::default(),
        }
    }

    /// Create runtime on system clock and the current tokio runtime.
    pub fn tokio() -> Result<Self, TryCurrentError> {
        let scheduler = TokioScheduler::current()?;
        Ok(Self::new(Arc::new(SystemClock), Arc::new(scheduler)))
    }

    /// Create runtime on system clock and a dedicated scheduling thread.
    pub fn threaded() -> std::io::Result<Self> {
        let scheduler = ThreadScheduler::new()?;
        Ok(Self::new(Arc::new(SystemClock), Arc::new(scheduler)))
    }

    /// Create simulated runtime.
    /// Returns clock and scheduler, which owner moves and polls.
    pub fn manual() -> (Self, Arc<ManualClock>, Arc<ManualScheduler>) {
        let clock = Arc::new(ManualClock::starting_now());
        let scheduler = Arc::new(ManualScheduler::new(clock.clone()));
        let runtime = Self::new(clock.clone(), scheduler.clone());
        (runtime, clock, scheduler)
    }

    /// Replace settings.
    pub fn with_settings(mut self, settings: TimerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Returns scheduler.
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    /// Returns settings.
    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Smallest delay used to arm a trigger.
    pub(crate) fn min_delay(&self) -> Duration {
        self.settings.min_rearm_delay.max(Duration::from_nanos(1))
    }
}
