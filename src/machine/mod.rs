//! Definition of [`TimerCore`], the lock-free state machine under every [timer][crate::Timer].

mod timer_core;

pub use timer_core::TimerCore;

#[cfg(test)]
mod tests;
