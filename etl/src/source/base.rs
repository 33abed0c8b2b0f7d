use std::future::Future;

use crate::error::EtlResult;
use crate::types::Record;

/// Trait for systems that produce the records to ingest.
///
/// The pipeline calls [`Source::next_record`] sequentially from its producer until the source
/// returns `Ok(None)`. An `Err` stops production: records already handed to the pipeline are
/// still flushed, but the source is not polled again.
pub trait Source: Send {
    /// Returns the name of the source.
    fn name() -> &'static str;

    /// Returns the next record, or `None` once the source is exhausted.
    fn next_record(&mut self) -> impl Future<Output = EtlResult<Option<Record>>> + Send;
}
