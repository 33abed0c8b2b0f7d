//! Concurrency primitives connecting the producer, the bulk workers and the reporter.
//!
//! - The [`queue`] module implements the bounded multi-consumer queue between the producer and
//!   the workers. A full queue suspends the producer, which is the only backpressure mechanism
//!   of the pipeline.
//! - The [`signal`] module provides the coalescing tick channel workers use to wake the progress
//!   reporter after every flush.

pub mod queue;
pub mod signal;
