//! Record source abstractions for ingestion pipelines.
//!
//! A [`Source`] is a lazy, finite, forward-only sequence of [`crate::types::Record`]s. The
//! pipeline pulls from it on a single producer task.

mod base;
pub mod memory;

pub use base::Source;
