#![cfg(feature = "test-utils")]

use etl::destination::Destination;
use etl::destination::memory::MemoryDestination;
use etl::error::EtlResult;
use etl::pipeline::Pipeline;
use etl::source::Source;
use etl::source::memory::MemorySource;
use etl::test_utils::notify::within_timeout;
use etl::test_utils::progress::TestProgress;
use etl::test_utils::records::{numbered_record, numbered_records, record_id};
use etl::types::{BulkOutcome, Record};
use etl_config::shared::{BatchConfig, PipelineConfig};
use etl_telemetry::tracing::init_test_tracing;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

/// Source counting how many records were pulled out of it.
#[derive(Debug)]
struct CountingSource {
    total: u64,
    reads: Arc<AtomicU64>,
}

impl Source for CountingSource {
    fn name() -> &'static str {
        "counting"
    }

    async fn next_record(&mut self) -> EtlResult<Option<Record>> {
        let read = self.reads.load(Ordering::SeqCst);
        if read >= self.total {
            return Ok(None);
        }

        self.reads.fetch_add(1, Ordering::SeqCst);

        Ok(Some(numbered_record(read)))
    }
}

/// Destination whose bulk calls wait until the test opens the gate.
#[derive(Debug, Clone)]
struct GatedDestination {
    gate: Arc<Semaphore>,
}

impl Destination for GatedDestination {
    fn name() -> &'static str {
        "gated"
    }

    async fn write_batch(&self, records: Vec<Record>) -> EtlResult<BulkOutcome> {
        // The permit is returned on drop, so one opened gate serves every later call.
        let _permit = self.gate.acquire().await;

        Ok(BulkOutcome::all_succeeded(records.len()))
    }
}

fn pipeline_config(max_size: usize, max_workers: u16) -> PipelineConfig {
    PipelineConfig {
        batch: BatchConfig { max_size },
        max_workers,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn stalled_destination_suspends_the_producer() {
    init_test_tracing();

    let reads = Arc::new(AtomicU64::new(0));
    let source = CountingSource {
        total: 1000,
        reads: reads.clone(),
    };
    let gate = Arc::new(Semaphore::new(0));
    let destination = GatedDestination { gate: gate.clone() };

    // Two workers with batches of five give a queue capacity of ten.
    let pipeline = Pipeline::new(pipeline_config(5, 2), source, destination);
    let progress = TestProgress::new();
    let run = tokio::spawn(pipeline.run(progress.clone()));

    sleep(Duration::from_millis(500)).await;

    // Each worker holds one full batch in a pending bulk call, the queue holds ten records and
    // the producer waits with one more record it could not enqueue.
    assert_eq!(reads.load(Ordering::SeqCst), 21);
    assert!(progress.reports().is_empty());

    gate.add_permits(1);

    let summary = within_timeout(run).await.unwrap().unwrap();

    assert_eq!(reads.load(Ordering::SeqCst), 1000);
    assert_eq!(summary.results.succeeded, 1000);
    assert_eq!(summary.results.failed, 0);
    assert_eq!(progress.finished(), Some(summary.results));
}

#[tokio::test(flavor = "multi_thread")]
async fn records_reach_the_destination_exactly_once() {
    init_test_tracing();

    let destination = MemoryDestination::new();
    destination.provision().await.unwrap();

    let pipeline = Pipeline::new(
        pipeline_config(64, 4),
        MemorySource::new(numbered_records(5000)),
        destination.clone(),
    );
    let summary = within_timeout(pipeline.run(TestProgress::new()))
        .await
        .unwrap();

    let mut ids: Vec<u64> = destination
        .records()
        .await
        .iter()
        .filter_map(record_id)
        .collect();
    ids.sort_unstable();

    assert_eq!(ids, (0..5000).collect::<Vec<_>>());
    assert_eq!(summary.enqueued, 5000);
    assert_eq!(summary.results.succeeded, 5000);
    assert_eq!(summary.workers.len(), 4);
    assert_eq!(
        summary.workers.iter().map(|stats| stats.records).sum::<u64>(),
        5000
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn progress_reports_never_go_backwards() {
    init_test_tracing();

    let progress = TestProgress::new();
    let pipeline = Pipeline::new(
        pipeline_config(10, 3),
        MemorySource::new(numbered_records(1000)),
        MemoryDestination::new(),
    );
    let summary = within_timeout(pipeline.run(progress.clone()))
        .await
        .unwrap();

    let reports = progress.reports();
    assert!(!reports.is_empty());
    assert!(reports.len() as u64 <= summary.batches());
    assert!(reports.windows(2).all(|pair| pair[0].total() <= pair[1].total()));
    assert_eq!(reports.last().copied(), Some(summary.results));
}
