use std::sync::{Arc, Mutex};

use crate::progress::ProgressSink;
use crate::results::ResultsSnapshot;

#[derive(Debug, Default)]
struct Inner {
    reports: Vec<ResultsSnapshot>,
    finished: Option<ResultsSnapshot>,
}

/// Progress sink that keeps every snapshot it receives.
///
/// Clones share the captured snapshots, so a test can hand one clone to the pipeline and
/// inspect the other.
#[derive(Debug, Clone, Default)]
pub struct TestProgress {
    inner: Arc<Mutex<Inner>>,
}

impl TestProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshots received through [`ProgressSink::report`].
    pub fn reports(&self) -> Vec<ResultsSnapshot> {
        self.lock().reports.clone()
    }

    /// Returns the snapshot received through [`ProgressSink::finish`], if any.
    pub fn finished(&self) -> Option<ResultsSnapshot> {
        self.lock().finished
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock already fails the test, keep reading the data.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressSink for TestProgress {
    fn report(&mut self, snapshot: ResultsSnapshot) {
        self.lock().reports.push(snapshot);
    }

    fn finish(&mut self, snapshot: ResultsSnapshot) {
        self.lock().finished = Some(snapshot);
    }
}
