use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::types::{BulkOutcome, Record};

type RejectCondition = Box<dyn Fn(&Record) -> bool + Send + Sync>;

#[derive(Default)]
struct Inner {
    batches: Vec<Vec<Record>>,
    failed_batches: Vec<Vec<Record>>,
}

/// Destination with scripted behavior that records every batch it receives.
///
/// By default every record is accepted. [`ScriptedDestination::rejecting`] makes the
/// destination reject matching records individually, [`ScriptedDestination::failing_calls`]
/// makes chosen bulk calls fail at the transport level, and [`ScriptedDestination::with_delay`]
/// slows every call down so that concurrent calls overlap.
#[derive(Clone)]
pub struct ScriptedDestination {
    inner: Arc<Mutex<Inner>>,
    reject: Arc<Option<RejectCondition>>,
    failing_calls: Arc<HashSet<usize>>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl fmt::Debug for ScriptedDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedDestination")
            .field("failing_calls", &self.failing_calls)
            .field("delay", &self.delay)
            .field("calls", &self.calls.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for ScriptedDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDestination {
    /// Creates a destination accepting every record.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            reject: Arc::new(None),
            failing_calls: Arc::new(HashSet::new()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Rejects every record for which `condition` returns `true`.
    pub fn rejecting<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.reject = Arc::new(Some(Box::new(condition)));
        self
    }

    /// Fails the bulk calls with the given zero-based call indices at the transport level.
    pub fn failing_calls(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_calls = Arc::new(calls.into_iter().collect());
        self
    }

    /// Sleeps for `delay` inside every bulk call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the sizes of the successfully delivered batches, in arrival order.
    pub async fn batch_sizes(&self) -> Vec<usize> {
        let inner = self.inner.lock().await;
        inner.batches.iter().map(Vec::len).collect()
    }

    /// Returns the batches whose bulk call failed at the transport level.
    pub async fn failed_batches(&self) -> Vec<Vec<Record>> {
        let inner = self.inner.lock().await;
        inner.failed_batches.clone()
    }

    /// Returns every record of every successfully delivered batch.
    pub async fn records(&self) -> Vec<Record> {
        let inner = self.inner.lock().await;
        inner.batches.iter().flatten().cloned().collect()
    }

    /// Returns the number of bulk calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the highest number of bulk calls that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Destination for ScriptedDestination {
    fn name() -> &'static str {
        "scripted"
    }

    async fn write_batch(&self, records: Vec<Record>) -> EtlResult<BulkOutcome> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut inner = self.inner.lock().await;

            if self.failing_calls.contains(&call) {
                inner.failed_batches.push(records);

                Err(etl_error!(
                    ErrorKind::DestinationConnectionFailed,
                    "Bulk request failed",
                    format!("Scripted transport failure on call {call}")
                ))
            } else {
                let rejected = match self.reject.as_ref() {
                    Some(condition) => records.iter().filter(|record| condition(record)).count(),
                    None => 0,
                };
                let outcome = BulkOutcome::new((records.len() - rejected) as u64, rejected as u64);
                inner.batches.push(records);

                Ok(outcome)
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result
    }
}
