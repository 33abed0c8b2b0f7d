//! Progress reporting driven by flush ticks.

use std::io::{self, Write};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::concurrency::signal::TickRx;
use crate::results::{ResultCounters, ResultsSnapshot};

/// Receiver of progress snapshots.
///
/// [`ProgressSink::report`] is called from the reporter task on every tick, never from a worker,
/// so a slow sink can only delay progress output and never the pipeline itself.
pub trait ProgressSink: Send + 'static {
    /// Receives the latest snapshot of the counters.
    fn report(&mut self, snapshot: ResultsSnapshot);

    /// Receives the final snapshot once every worker has stopped.
    fn finish(&mut self, snapshot: ResultsSnapshot) {
        self.report(snapshot);
    }
}

/// Prints a single self-overwriting `Succeeded: N Failed: M` line on stdout.
#[derive(Debug, Default)]
pub struct TerminalProgress;

impl TerminalProgress {
    pub fn new() -> Self {
        Self
    }

    fn print(&self, snapshot: ResultsSnapshot, newline: bool) {
        let mut stdout = io::stdout().lock();

        // Progress output is best-effort, a closed stdout must not fail the run.
        let _ = write!(stdout, "\r{snapshot}");
        if newline {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }
}

impl ProgressSink for TerminalProgress {
    fn report(&mut self, snapshot: ResultsSnapshot) {
        self.print(snapshot, false);
    }

    fn finish(&mut self, snapshot: ResultsSnapshot) {
        self.print(snapshot, true);
    }
}

/// Sink that discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&mut self, _snapshot: ResultsSnapshot) {}
}

/// Spawns the reporter task.
///
/// The task renders a snapshot for every received tick and returns the sink once all tick
/// transmitters are dropped, which happens when the last worker exits.
pub fn spawn_reporter<P>(
    mut tick_rx: TickRx,
    counters: Arc<ResultCounters>,
    mut sink: P,
) -> JoinHandle<P>
where
    P: ProgressSink,
{
    tokio::spawn(async move {
        let mut reports: u64 = 0;

        while tick_rx.recv().await.is_some() {
            sink.report(counters.snapshot());
            reports += 1;
        }

        debug!(reports, "progress reporter stopped");

        sink
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ResultAggregator;
    use crate::test_utils::progress::TestProgress;
    use crate::types::BulkOutcome;

    #[tokio::test]
    async fn reporter_renders_snapshots_until_aggregators_drop() {
        let (aggregator, tick_rx) = ResultAggregator::new();
        let progress = TestProgress::new();

        let reporter = spawn_reporter(tick_rx, aggregator.counters(), progress.clone());

        aggregator.record(BulkOutcome::new(10, 0));
        aggregator.record(BulkOutcome::new(5, 5));
        drop(aggregator);

        let sink = reporter.await.unwrap();
        let reports = sink.reports();

        // Ticks may coalesce, but the last report always reflects every applied outcome.
        assert!(!reports.is_empty());
        assert!(reports.len() <= 2);
        assert_eq!(
            reports.last().copied(),
            Some(ResultsSnapshot {
                succeeded: 15,
                failed: 5
            })
        );
        assert!(reports.windows(2).all(|w| w[0].total() <= w[1].total()));
    }
}
