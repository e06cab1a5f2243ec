//! Definition of [`Snapshot`], the durable representation of a [timer][crate::Timer],
//! and of the conversions between timers, snapshots and their JSON text.

mod codec;
mod error;
mod snapshot;

pub use error::DecodeError;
pub use snapshot::Snapshot;

#[cfg(test)]
mod tests;
