//! Cancellation-aware operations on the bounded queues linking the stages.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("queue closed by the receiving stage")]
    Closed,
}

/// Sends `item`, waiting for capacity unless `cancel` fires first.
pub async fn send<T>(
    tx: &mpsc::Sender<T>,
    item: T,
    cancel: &CancellationToken,
) -> Result<(), QueueError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(QueueError::Cancelled),
        res = tx.send(item) => res.map_err(|_| QueueError::Closed),
    }
}

/// Receives the next item. `Ok(None)` means the sender closed the queue.
pub async fn recv<T>(
    rx: &mut mpsc::Receiver<T>,
    cancel: &CancellationToken,
) -> Result<Option<T>, QueueError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(QueueError::Cancelled),
        item = rx.recv() => Ok(item),
    }
}
