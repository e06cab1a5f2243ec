//! Conversions between live [`Timer`] and its [`Snapshot`].

use crate::{live::Timer, machine::TimerCore, TimerRuntime};

use super::{error::DecodeError, snapshot::Snapshot};

impl Timer {
    /// Returns durable snapshot of the timer.
    ///
    /// Running timer whose deadline has silently passed is recorded as expired,
    /// with stop time equal to the time of export rather than the missed deadline.
    pub fn export(&self) -> Snapshot {
        self.observe(|core, _| Snapshot::from_core(core))
    }

    /// Replace timer's state with the snapshot, or with uninitialized state if snapshot is absent.
    ///
    /// Armed trigger is canceled and callback is dropped, so it must be attached again.
    /// Timer whose deadline passed while it was persisted becomes expired immediately.
    pub fn import(&self, snapshot: Option<&Snapshot>) {
        let core = snapshot.map_or_else(TimerCore::zeroed, Snapshot::to_core);
        self.replace_core(core);
        log::debug!("Timer imported in state {}", self.state());
    }

    /// Create timer from the snapshot, or uninitialized timer if snapshot is absent.
    pub fn restore(snapshot: Option<&Snapshot>, runtime: &TimerRuntime) -> Self {
        let timer = Timer::from_core(TimerCore::zeroed(), runtime);
        timer.import(snapshot);
        timer
    }

    /// Encode timer as JSON text of its [snapshot][Timer::export].
    pub fn encode(&self) -> String {
        self.export().to_json()
    }

    /// Replace timer's state with the decoded snapshot.
    /// JSON `null` stands for uninitialized timer.
    ///
    /// On error the timer is left unmodified.
    pub fn decode(&self, json: &str) -> Result<(), DecodeError> {
        let snapshot = Snapshot::from_json(json)?;
        self.import(snapshot.as_ref());
        Ok(())
    }

    /// Create timer from JSON text.
    pub fn from_text(json: &str, runtime: &TimerRuntime) -> Result<Self, DecodeError> {
        let snapshot = Snapshot::from_json(json)?;
        Ok(Self::restore(snapshot.as_ref(), runtime))
    }
}
