use tracing::{debug, info};

use crate::concurrency::queue::{Dequeued, QueueRx};
use crate::destination::Destination;
use crate::workers::batch::BatchAccumulator;

/// Statistics reported by a [`BulkWorker`] once it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkWorkerStats {
    /// Identifier of the worker within its pool.
    pub worker_id: usize,
    /// Number of records the worker dequeued.
    pub records: u64,
    /// Number of bulk calls the worker made.
    pub batches: u64,
}

/// Long-lived consumer draining the queue into bulk calls.
///
/// The worker owns its batch, no state is shared with other workers besides the queue and the
/// result counters.
#[derive(Debug)]
pub struct BulkWorker<D> {
    worker_id: usize,
    queue: QueueRx,
    accumulator: BatchAccumulator<D>,
}

impl<D> BulkWorker<D>
where
    D: Destination,
{
    /// Creates a new [`BulkWorker`] consuming from `queue`.
    pub fn new(worker_id: usize, queue: QueueRx, accumulator: BatchAccumulator<D>) -> Self {
        Self {
            worker_id,
            queue,
            accumulator,
        }
    }

    /// Consumes records until the queue reports end of stream.
    ///
    /// The residual batch is flushed exactly once after end of stream, so every record this
    /// worker dequeued has been accounted for when the method returns.
    pub async fn run(mut self) -> BulkWorkerStats {
        let mut stats = BulkWorkerStats {
            worker_id: self.worker_id,
            ..BulkWorkerStats::default()
        };

        debug!(worker_id = self.worker_id, "bulk worker started");

        loop {
            match self.queue.dequeue().await {
                Dequeued::Record(record) => {
                    stats.records += 1;
                    if self.accumulator.add(record).await.is_some() {
                        stats.batches += 1;
                    }
                }
                Dequeued::EndOfStream => {
                    if self.accumulator.flush().await.is_some() {
                        stats.batches += 1;
                    }
                    break;
                }
            }
        }

        info!(
            worker_id = stats.worker_id,
            records = stats.records,
            batches = stats.batches,
            "bulk worker finished"
        );

        stats
    }
}
