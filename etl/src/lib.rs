//! Bounded, concurrent batch ingestion.
//!
//! A producer streams [`types::Record`]s from a [`source::Source`] into a fixed-capacity queue,
//! a fixed set of workers drains the queue into size-bounded batches and flushes every batch as
//! one synchronous bulk call against a [`destination::Destination`]. Per-record outcomes are
//! accumulated in process-wide atomic counters which drive progress reporting.
//!
//! The entry point is [`pipeline::Pipeline`].

pub mod concurrency;
pub mod destination;
pub mod error;
mod macros;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod results;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
