//! Process-wide accounting of per-record outcomes.
//!
//! Workers apply the [`BulkOutcome`] of every flush to a shared [`ResultCounters`] and push a
//! tick so the progress reporter can render a fresh [`ResultsSnapshot`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::concurrency::signal::{TickRx, TickTx, create_tick_channel};
use crate::types::BulkOutcome;

/// Monotonic success and failure counters shared by every worker.
///
/// The counters can only be incremented and read, there is no way to reset them during a run.
#[derive(Debug, Default)]
pub struct ResultCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl ResultCounters {
    /// Creates counters starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `succeeded` and `failed` to the counters.
    pub(crate) fn add(&self, succeeded: u64, failed: u64) {
        if succeeded > 0 {
            self.succeeded.fetch_add(succeeded, Ordering::Relaxed);
        }
        if failed > 0 {
            self.failed.fetch_add(failed, Ordering::Relaxed);
        }
    }

    /// Adds the counts of one flush to the counters.
    pub(crate) fn apply(&self, outcome: BulkOutcome) {
        self.add(outcome.succeeded, outcome.failed);
    }

    /// Reads both counters.
    ///
    /// The two values are loaded independently, so a snapshot taken while workers are flushing
    /// can lag behind by one outcome. Once every worker has stopped the snapshot is exact.
    pub fn snapshot(&self) -> ResultsSnapshot {
        ResultsSnapshot {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the [`ResultCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultsSnapshot {
    pub succeeded: u64,
    pub failed: u64,
}

impl ResultsSnapshot {
    /// Returns the number of records accounted for so far.
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }
}

impl fmt::Display for ResultsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Succeeded: {} Failed: {}", self.succeeded, self.failed)
    }
}

/// Handle used by workers to publish flush outcomes.
///
/// Every clone shares the same counters and tick channel. The progress reporter stops once all
/// clones are dropped.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    counters: Arc<ResultCounters>,
    tick_tx: TickTx,
}

impl ResultAggregator {
    /// Creates an aggregator and the receiving half of its tick channel.
    pub fn new() -> (Self, TickRx) {
        let (tick_tx, tick_rx) = create_tick_channel();

        let aggregator = Self {
            counters: Arc::new(ResultCounters::new()),
            tick_tx,
        };

        (aggregator, tick_rx)
    }

    /// Applies a flush outcome and notifies the reporter without ever waiting on it.
    pub(crate) fn record(&self, outcome: BulkOutcome) {
        self.counters.apply(outcome);
        self.tick_tx.tick();
    }

    /// Returns the shared counters.
    pub fn counters(&self) -> Arc<ResultCounters> {
        self.counters.clone()
    }

    /// Returns the current counter values.
    pub fn snapshot(&self) -> ResultsSnapshot {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        const TASKS: u64 = 8;
        const INCREMENTS: u64 = 10_000;

        let counters = Arc::new(ResultCounters::new());

        let mut handles = Vec::new();
        for _ in 0..TASKS {
            let counters = counters.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..INCREMENTS {
                    counters.add(1, 1);
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.succeeded, TASKS * INCREMENTS);
        assert_eq!(snapshot.failed, TASKS * INCREMENTS);
    }

    #[tokio::test]
    async fn record_applies_outcome_and_ticks() {
        let (aggregator, mut tick_rx) = ResultAggregator::new();

        aggregator.record(BulkOutcome::new(9, 1));
        aggregator.record(BulkOutcome::new(10, 0));

        assert_eq!(aggregator.snapshot(), ResultsSnapshot { succeeded: 19, failed: 1 });
        // Both ticks were coalesced into the single slot.
        assert!(tick_rx.recv().await.is_some());
        assert!(tick_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn tick_channel_closes_when_aggregators_drop() {
        let (aggregator, mut tick_rx) = ResultAggregator::new();
        let clone = aggregator.clone();

        drop(aggregator);
        drop(clone);

        assert!(tick_rx.recv().await.is_none());
    }

    #[test]
    fn snapshot_renders_progress_line() {
        let snapshot = ResultsSnapshot {
            succeeded: 2250,
            failed: 250,
        };

        assert_eq!(snapshot.to_string(), "Succeeded: 2250 Failed: 250");
        assert_eq!(snapshot.total(), 2500);
    }
}
