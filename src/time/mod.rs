//! Definition of time sources and [schedulers][Scheduler], which are used by [timers][crate::Timer].

pub mod clock;
pub mod scheduler;

mod manual_scheduler;
mod thread_scheduler;
mod tokio_scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manual_scheduler::ManualScheduler;
pub use scheduler::{Action, Scheduler, TriggerHandle};
pub use thread_scheduler::ThreadScheduler;
pub use tokio_scheduler::TokioScheduler;
