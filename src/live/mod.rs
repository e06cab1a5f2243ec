//! Definition of [`Timer`], the thread-safe timer which arms background triggers
//! and dispatches its callback exactly once per epoch.

mod query;
mod runtime;
mod timer;

pub use query::TimerQuery;
pub use runtime::TimerRuntime;
pub use timer::{Callback, Timer};
