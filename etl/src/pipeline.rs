//! Coordinator running one ingestion from a [`Source`] into a [`Destination`].

use etl_config::shared::PipelineConfig;
use tracing::{error, info};

use crate::concurrency::queue::bounded_queue;
use crate::destination::Destination;
use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::etl_error;
use crate::metrics::register_metrics;
use crate::progress::{ProgressSink, spawn_reporter};
use crate::results::{ResultAggregator, ResultsSnapshot};
use crate::source::Source;
use crate::workers::batch::BatchAccumulator;
use crate::workers::bulk::{BulkWorker, BulkWorkerStats};
use crate::workers::pool::BulkWorkerPool;

/// Final report of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    /// Number of records read from the source and handed to the workers.
    pub enqueued: u64,
    /// Final counter values. Every enqueued record is counted exactly once.
    pub results: ResultsSnapshot,
    /// Statistics of every worker, ordered by worker id.
    pub workers: Vec<BulkWorkerStats>,
}

impl IngestSummary {
    /// Returns the total number of bulk calls made.
    pub fn batches(&self) -> u64 {
        self.workers.iter().map(|stats| stats.batches).sum()
    }
}

/// One-shot ingestion pipeline.
///
/// The destination must already be provisioned and the source connected, the pipeline only
/// moves records between them.
#[derive(Debug)]
pub struct Pipeline<S, D> {
    config: PipelineConfig,
    source: S,
    destination: D,
}

impl<S, D> Pipeline<S, D>
where
    S: Source,
    D: Destination + Clone + Send + Sync + 'static,
{
    pub fn new(config: PipelineConfig, source: S, destination: D) -> Self {
        Self {
            config,
            source,
            destination,
        }
    }

    /// Runs the ingestion to completion.
    ///
    /// Streams the source into a queue holding `batch.max_size × max_workers` records, which a
    /// fixed pool of `max_workers` workers drains into bulk calls. The producer is suspended
    /// whenever the queue is full. Once the source is exhausted the queue is closed, every worker
    /// flushes its residual batch, and `progress` receives the final counters.
    ///
    /// A configuration error aborts before any record is read. A source error stops production,
    /// but records already enqueued are still flushed and counted before the error is returned.
    pub async fn run<P>(mut self, progress: P) -> EtlResult<IngestSummary>
    where
        P: ProgressSink,
    {
        self.config.validate().map_err(|err| {
            etl_error!(
                ErrorKind::ConfigError,
                "Invalid pipeline configuration",
                err.to_string(),
                source: err
            )
        })?;

        let Some(capacity) = self.config.queue_capacity() else {
            return Err(etl_error!(
                ErrorKind::ConfigError,
                "Invalid pipeline configuration",
                format!(
                    "A queue of {} batches of {} records does not fit in memory",
                    self.config.max_workers, self.config.batch.max_size
                )
            ));
        };

        register_metrics();

        let max_batch_size = self.config.batch.max_size;
        let workers = usize::from(self.config.max_workers);

        info!(
            source = S::name(),
            destination = D::name(),
            max_batch_size,
            workers,
            capacity,
            "starting ingestion pipeline"
        );

        let (queue_tx, queue_rx) = bounded_queue(capacity)?;
        let (aggregator, tick_rx) = ResultAggregator::new();
        let counters = aggregator.counters();
        let reporter = spawn_reporter(tick_rx, counters.clone(), progress);

        let mut pool = BulkWorkerPool::new();
        for worker_id in 0..workers {
            let accumulator = BatchAccumulator::new(
                worker_id,
                max_batch_size,
                self.destination.clone(),
                aggregator.clone(),
            );
            pool.spawn(BulkWorker::new(worker_id, queue_rx.clone(), accumulator));
        }

        // Only the workers may keep the queue and the tick channel open, otherwise the queue
        // would never report end of stream and the reporter would never stop.
        drop(queue_rx);
        drop(aggregator);

        let mut errors: Vec<EtlError> = Vec::new();
        let mut enqueued: u64 = 0;

        loop {
            let record = match self.source.next_record().await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(err) => {
                    error!(
                        error = %err,
                        enqueued,
                        "source failed, draining already enqueued records"
                    );
                    errors.push(err);
                    break;
                }
            };

            if let Err(err) = queue_tx.enqueue(record).await {
                error!(error = %err, enqueued, "failed to enqueue record");
                errors.push(err);
                break;
            }

            enqueued += 1;
        }

        queue_tx.close();

        let worker_stats = match pool.wait_all().await {
            Ok(stats) => stats,
            Err(err) => {
                errors.push(err);
                Vec::new()
            }
        };

        let mut progress = match reporter.await {
            Ok(progress) => Some(progress),
            Err(join_err) => {
                errors.push(etl_error!(
                    ErrorKind::WorkerPanic,
                    "Progress reporter panicked",
                    join_err
                ));
                None
            }
        };

        let results = counters.snapshot();
        if let Some(progress) = progress.as_mut() {
            progress.finish(results);
        }

        info!(
            enqueued,
            succeeded = results.succeeded,
            failed = results.failed,
            "ingestion pipeline finished"
        );

        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(IngestSummary {
            enqueued,
            results,
            workers: worker_stats,
        })
    }
}
