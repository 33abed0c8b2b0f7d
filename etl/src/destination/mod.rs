//! Data destination abstractions for ingestion pipelines.
//!
//! This module provides the core [`Destination`] trait that bulk workers flush their batches
//! into, and an in-memory implementation used for dry runs and tests.

mod base;
pub mod memory;

pub use base::Destination;
