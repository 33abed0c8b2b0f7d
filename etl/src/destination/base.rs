use std::future::Future;

use crate::error::EtlResult;
use crate::types::{BulkOutcome, Record};

/// Trait for systems that can receive batches of records through a bulk API.
///
/// [`Destination`] implementations define how a batch is written to the target system and how
/// the target is prepared before the first batch arrives.
///
/// [`Destination::write_batch`] is called concurrently by every bulk worker, so implementations
/// must handle concurrent writes safely. A call performs exactly one round-trip per batch and
/// is never retried by the pipeline, which means implementations must not assume idempotency.
pub trait Destination {
    /// Returns the name of the destination.
    fn name() -> &'static str;

    /// Prepares the destination before ingestion starts.
    ///
    /// Called once by the caller before the pipeline runs. Implementations must be idempotent:
    /// provisioning an already provisioned destination succeeds without changing it. The
    /// default implementation is a no-op.
    fn provision(&self) -> impl Future<Output = EtlResult<()>> + Send {
        async { Ok(()) }
    }

    /// Writes one batch of records as a single bulk operation.
    ///
    /// Records rejected individually by the target are reported through the returned
    /// [`BulkOutcome`] and do not fail the call. An `Err` means the bulk operation itself failed,
    /// for example because the target was unreachable, in which case the outcome of every record
    /// in the batch is unknown.
    fn write_batch(
        &self,
        records: Vec<Record>,
    ) -> impl Future<Output = EtlResult<BulkOutcome>> + Send;
}
