//! Bulk workers draining the queue into the destination.
//!
//! - [`batch`] holds the per-worker [`batch::BatchAccumulator`].
//! - [`bulk`] holds the worker loop.
//! - [`pool`] owns the fixed set of worker tasks.

pub mod batch;
pub mod bulk;
pub mod pool;
