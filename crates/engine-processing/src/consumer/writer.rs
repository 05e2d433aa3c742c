use crate::{
    consumer::target::{TargetReport, WriteTarget},
    error::ConsumerError,
    queue::{self, QueueError},
};
use model::records::document::Document;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Documents accepted by the target and forwarded for confirmation.
    pub written: u64,
    pub target: TargetReport,
}

/// Moves documents from the item queue into a [`WriteTarget`] and forwards
/// each accepted document, unchanged, to the confirmed queue.
pub struct DestinationWriter {
    items_rx: mpsc::Receiver<Document>,
    confirmed_tx: Option<mpsc::Sender<Document>>,
    target: WriteTarget,
    cancel: CancellationToken,
}

impl DestinationWriter {
    pub fn new(
        items_rx: mpsc::Receiver<Document>,
        confirmed_tx: mpsc::Sender<Document>,
        target: WriteTarget,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            items_rx,
            confirmed_tx: Some(confirmed_tx),
            target,
            cancel,
        }
    }

    /// A document is forwarded for confirmation as soon as the target accepts
    /// it. For a store that means it sits in the batch buffer and may not have
    /// been acknowledged yet; only a successful return guarantees the buffer
    /// was flushed. The confirmed queue is closed when this returns.
    pub async fn run(&mut self) -> Result<WriteSummary, ConsumerError> {
        let result = match self.drain().await {
            Ok(written) => self.finish(written).await,
            Err(e) => {
                self.target.close_after_failure(&self.cancel).await;
                Err(e)
            }
        };
        self.close_channel();
        result
    }

    fn close_channel(&mut self) {
        self.confirmed_tx = None;
    }

    async fn drain(&mut self) -> Result<u64, ConsumerError> {
        let mut written = 0u64;

        while let Some(doc) = queue::recv(&mut self.items_rx, &self.cancel).await? {
            self.target.write(&doc).await?;

            let tx = self.confirmed_tx.as_ref().ok_or(QueueError::Closed)?;
            queue::send(tx, doc, &self.cancel).await?;
            written += 1;
        }

        Ok(written)
    }

    async fn finish(&mut self, written: u64) -> Result<WriteSummary, ConsumerError> {
        let target = self.target.close().await?;
        info!(documents = written, "Destination writer finished");
        Ok(WriteSummary { written, target })
    }
}
