//! Progress tick signaling between bulk workers and the reporter.
//!
//! A tick carries no payload, it only tells the reporter that the counters changed. The channel
//! has a single slot: sending never waits, and a tick sent while one is already pending is
//! coalesced into it.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Transmitter side of the tick channel.
///
/// Every clone keeps the channel open. The reporter stops once all transmitters are dropped.
#[derive(Debug, Clone)]
pub struct TickTx {
    tx: mpsc::Sender<()>,
}

impl TickTx {
    /// Emits a tick without waiting.
    ///
    /// Returns `false` when the tick was coalesced into a pending one or nobody listens anymore.
    pub fn tick(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) | Err(TrySendError::Closed(())) => false,
        }
    }
}

/// Receiver side of the tick channel.
pub type TickRx = mpsc::Receiver<()>;

/// Creates a new single-slot tick channel.
pub fn create_tick_channel() -> (TickTx, TickRx) {
    let (tx, rx) = mpsc::channel(1);
    (TickTx { tx }, rx)
}
