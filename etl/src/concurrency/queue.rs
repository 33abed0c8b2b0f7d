//! Bounded multi-consumer queue between the producer and the bulk workers.

use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore, mpsc};

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::types::Record;

/// Result of a [`QueueRx::dequeue`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued {
    /// The next buffered record.
    Record(Record),
    /// The queue was closed and every buffered record has been handed out.
    EndOfStream,
}

/// Creates a queue that buffers at most `capacity` records.
///
/// Returns an error when `capacity` is zero, since such a queue could never accept a record, or
/// larger than the runtime can track.
pub fn bounded_queue(capacity: usize) -> EtlResult<(QueueTx, QueueRx)> {
    if capacity == 0 {
        bail!(
            ErrorKind::ConfigError,
            "Invalid queue capacity",
            "The queue capacity must be greater than zero"
        );
    }

    if capacity > Semaphore::MAX_PERMITS {
        bail!(
            ErrorKind::ConfigError,
            "Invalid queue capacity",
            format!(
                "The queue capacity {capacity} exceeds the maximum of {}",
                Semaphore::MAX_PERMITS
            )
        );
    }

    let (tx, rx) = mpsc::channel(capacity);

    Ok((
        QueueTx { tx },
        QueueRx {
            rx: Arc::new(Mutex::new(rx)),
        },
    ))
}

/// Producer side of the queue.
///
/// There is exactly one producer. Closing the queue consumes the handle, so no record can be
/// enqueued after [`QueueTx::close`].
#[derive(Debug)]
pub struct QueueTx {
    tx: mpsc::Sender<Record>,
}

impl QueueTx {
    /// Enqueues a record, waiting while the queue is at capacity.
    ///
    /// Fails with [`ErrorKind::QueueClosed`] only when every consumer is gone, in which case the
    /// record can never be delivered.
    pub async fn enqueue(&self, record: Record) -> EtlResult<()> {
        self.tx.send(record).await.map_err(|_| {
            etl_error!(
                ErrorKind::QueueClosed,
                "Queue has no consumers left",
                "All bulk workers stopped before the source was exhausted"
            )
        })
    }

    /// Returns the maximum number of records the queue can buffer.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Returns the number of records currently buffered.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Returns `true` if no records are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the queue.
    ///
    /// Consumers keep receiving the records that are already buffered and then observe
    /// [`Dequeued::EndOfStream`].
    pub fn close(self) {
        drop(self.tx);
    }
}

/// Consumer side of the queue.
///
/// Cloning the handle adds a consumer. Every buffered record is delivered to exactly one
/// consumer, and each consumer sees the records it receives in enqueue order.
#[derive(Debug, Clone)]
pub struct QueueRx {
    rx: Arc<Mutex<mpsc::Receiver<Record>>>,
}

impl QueueRx {
    /// Dequeues the next record, waiting while the queue is empty and still open.
    pub async fn dequeue(&self) -> Dequeued {
        let mut rx = self.rx.lock().await;

        match rx.recv().await {
            Some(record) => Dequeued::Record(record),
            None => Dequeued::EndOfStream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn record(i: usize) -> Record {
        Record::new(format!(r#"{{"id":{i}}}"#))
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = bounded_queue(0).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[test]
    fn capacity_above_runtime_limit_is_rejected() {
        let err = bounded_queue(Semaphore::MAX_PERMITS + 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);

        let err = bounded_queue(1 << 62).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[tokio::test]
    async fn close_drains_buffered_records_before_end_of_stream() {
        let (tx, rx) = bounded_queue(4).unwrap();

        tx.enqueue(record(1)).await.unwrap();
        tx.enqueue(record(2)).await.unwrap();
        tx.close();

        assert_eq!(rx.dequeue().await, Dequeued::Record(record(1)));
        assert_eq!(rx.dequeue().await, Dequeued::Record(record(2)));
        assert_eq!(rx.dequeue().await, Dequeued::EndOfStream);
        assert_eq!(rx.dequeue().await, Dequeued::EndOfStream);
    }

    #[tokio::test]
    async fn enqueue_on_full_queue_waits_until_a_slot_frees() {
        let (tx, rx) = bounded_queue(10).unwrap();

        for i in 0..10 {
            tx.enqueue(record(i)).await.unwrap();
        }
        assert_eq!(tx.len(), 10);

        // Nobody dequeues, so the eleventh enqueue must stay pending without failing.
        let blocked = timeout(Duration::from_millis(100), tx.enqueue(record(10))).await;
        assert!(blocked.is_err());
        assert_eq!(tx.len(), 10);

        assert_eq!(rx.dequeue().await, Dequeued::Record(record(0)));

        timeout(Duration::from_secs(5), tx.enqueue(record(10)))
            .await
            .expect("enqueue should proceed once a slot is free")
            .unwrap();
        assert_eq!(tx.len(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn each_record_is_delivered_to_exactly_one_consumer() {
        let (tx, rx) = bounded_queue(8).unwrap();

        let mut consumers = Vec::new();
        for _ in 0..4 {
            let rx = rx.clone();
            consumers.push(tokio::spawn(async move {
                let mut received = Vec::new();
                while let Dequeued::Record(record) = rx.dequeue().await {
                    received.push(record);
                }
                received
            }));
        }
        drop(rx);

        for i in 0..500 {
            tx.enqueue(record(i)).await.unwrap();
        }
        tx.close();

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }

        let mut ids: Vec<String> = all.into_iter().map(Record::into_inner).collect();
        ids.sort();
        let mut expected: Vec<String> = (0..500).map(|i| record(i).into_inner()).collect();
        expected.sort();

        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn enqueue_without_consumers_fails() {
        let (tx, rx) = bounded_queue(2).unwrap();
        drop(rx);

        let err = tx.enqueue(record(1)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::QueueClosed);
    }
}
