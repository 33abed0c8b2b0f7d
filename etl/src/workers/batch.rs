use metrics::{counter, histogram};
use std::mem;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::destination::Destination;
use crate::metrics::{
    DESTINATION_LABEL, ETL_BATCH_SEND_DURATION_SECONDS, ETL_BATCHES_FAILED_TOTAL,
    ETL_BATCHES_FLUSHED_TOTAL, ETL_RECORDS_FAILED_TOTAL, ETL_RECORDS_SUCCEEDED_TOTAL,
};
use crate::results::ResultAggregator;
use crate::types::{BulkOutcome, Record};

/// Records preallocated per batch. Larger batches grow on demand.
const MAX_PREALLOCATED_RECORDS: usize = 1024;

/// Returns an empty batch sized for `max_batch_size` records, up to the preallocation limit.
fn empty_batch(max_batch_size: usize) -> Vec<Record> {
    Vec::with_capacity(max_batch_size.min(MAX_PREALLOCATED_RECORDS))
}

/// Per-worker buffer that turns single records into bulk calls.
///
/// The batch never holds more than `max_batch_size` records: the record that fills it triggers
/// a flush before [`BatchAccumulator::add`] returns. Flushes are synchronous, the worker does
/// not dequeue again until the destination has answered.
#[derive(Debug)]
pub struct BatchAccumulator<D> {
    worker_id: usize,
    batch: Vec<Record>,
    max_batch_size: usize,
    destination: D,
    aggregator: ResultAggregator,
}

impl<D> BatchAccumulator<D>
where
    D: Destination,
{
    /// Creates an empty accumulator.
    ///
    /// `max_batch_size` must be greater than zero, which the pipeline validates before any
    /// worker starts.
    pub fn new(
        worker_id: usize,
        max_batch_size: usize,
        destination: D,
        aggregator: ResultAggregator,
    ) -> Self {
        Self {
            worker_id,
            batch: empty_batch(max_batch_size),
            max_batch_size,
            destination,
            aggregator,
        }
    }

    /// Returns the number of records waiting for the next flush.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Returns `true` if no records wait for the next flush.
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Appends a record and flushes once the batch reached its maximum size.
    ///
    /// Returns the outcome of the flush, if one happened.
    pub async fn add(&mut self, record: Record) -> Option<BulkOutcome> {
        self.batch.push(record);

        if self.batch.len() >= self.max_batch_size {
            return self.flush().await;
        }

        None
    }

    /// Sends the current batch as one bulk call and applies its outcome.
    ///
    /// Does nothing on an empty batch. The batch is cleared whatever the result of the call. A
    /// transport-level failure counts every record of the batch as failed, no retry is made.
    pub async fn flush(&mut self) -> Option<BulkOutcome> {
        if self.batch.is_empty() {
            return None;
        }

        let records = mem::replace(&mut self.batch, empty_batch(self.max_batch_size));
        let batch_size = records.len();

        let before_sending = Instant::now();
        let result = self.destination.write_batch(records).await;
        let send_duration_seconds = before_sending.elapsed().as_secs_f64();

        histogram!(
            ETL_BATCH_SEND_DURATION_SECONDS,
            DESTINATION_LABEL => D::name(),
        )
        .record(send_duration_seconds);

        let outcome = match result {
            Ok(outcome) => outcome.reconcile(batch_size),
            Err(err) => {
                error!(
                    worker_id = self.worker_id,
                    batch_size,
                    error = %err,
                    "bulk call failed, counting the whole batch as failed"
                );

                counter!(ETL_BATCHES_FAILED_TOTAL, DESTINATION_LABEL => D::name()).increment(1);

                BulkOutcome::all_failed(batch_size)
            }
        };

        self.aggregator.record(outcome);

        counter!(ETL_BATCHES_FLUSHED_TOTAL, DESTINATION_LABEL => D::name()).increment(1);
        counter!(ETL_RECORDS_SUCCEEDED_TOTAL, DESTINATION_LABEL => D::name())
            .increment(outcome.succeeded);
        counter!(ETL_RECORDS_FAILED_TOTAL, DESTINATION_LABEL => D::name())
            .increment(outcome.failed);

        debug!(
            worker_id = self.worker_id,
            batch_size,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            send_duration_seconds,
            "flushed batch"
        );

        Some(outcome)
    }
}
