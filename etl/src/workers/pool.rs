use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::workers::bulk::{BulkWorker, BulkWorkerStats};

/// Fixed set of [`BulkWorker`] tasks.
///
/// Workers are spawned once before ingestion starts and live until the queue reports end of
/// stream. The pool never restarts or resizes workers.
#[derive(Debug, Default)]
pub struct BulkWorkerPool {
    join_set: JoinSet<BulkWorkerStats>,
}

impl BulkWorkerPool {
    /// Creates a new empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a worker on the runtime and tracks it in the pool.
    pub fn spawn<D>(&mut self, worker: BulkWorker<D>)
    where
        D: Destination + Send + Sync + 'static,
    {
        self.join_set.spawn(worker.run());

        debug!(workers = self.join_set.len(), "spawned bulk worker in pool");
    }

    /// Returns the number of workers that have not been joined yet.
    pub fn len(&self) -> usize {
        self.join_set.len()
    }

    /// Returns `true` if the pool tracks no workers.
    pub fn is_empty(&self) -> bool {
        self.join_set.is_empty()
    }

    /// Waits for every worker to stop.
    ///
    /// Workers stop on end of stream after their final flush. A panicking worker does not stop
    /// the others from draining the queue: all workers are awaited and the panics are returned
    /// as one aggregated error.
    pub async fn wait_all(mut self) -> EtlResult<Vec<BulkWorkerStats>> {
        let mut stats = Vec::with_capacity(self.join_set.len());
        let mut errors = Vec::new();

        while let Some(result) = self.join_set.join_next().await {
            match result {
                Ok(worker_stats) => stats.push(worker_stats),
                Err(join_err) => {
                    if join_err.is_cancelled() {
                        debug!("bulk worker task was cancelled");
                    } else {
                        error!(error = %join_err, "bulk worker panicked");
                        errors.push(etl_error!(
                            ErrorKind::WorkerPanic,
                            "Bulk worker panicked",
                            join_err
                        ));
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        stats.sort_by_key(|worker_stats| worker_stats.worker_id);

        Ok(stats)
    }
}
