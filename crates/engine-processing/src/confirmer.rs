use crate::{error::ConfirmerError, queue};
use engine_core::{connectors::sink::BulkSink, metrics::BulkStats, progress::ProgressCounter};
use model::records::{batch::BulkOperation, document::Document};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmSummary {
    pub confirmed: u64,
    /// Deletes handed to the source batch. Zero when deletion is off.
    pub deletes_queued: u64,
    pub bulk: Option<BulkStats>,
}

/// Counts confirmed documents and, when given a deleter, removes them from
/// the collection they were read from.
///
/// On failure the pending delete batch is dropped without being flushed.
pub struct SourceConfirmer {
    confirmed_rx: mpsc::Receiver<Document>,
    deleter: Option<Box<dyn BulkSink>>,
    progress: Option<ProgressCounter>,
    cancel: CancellationToken,
}

impl SourceConfirmer {
    pub fn new(
        confirmed_rx: mpsc::Receiver<Document>,
        deleter: Option<Box<dyn BulkSink>>,
        progress: ProgressCounter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            confirmed_rx,
            deleter,
            progress: Some(progress),
            cancel,
        }
    }

    pub async fn run(&mut self) -> Result<ConfirmSummary, ConfirmerError> {
        let mut summary = ConfirmSummary::default();

        while let Some(doc) = queue::recv(&mut self.confirmed_rx, &self.cancel).await? {
            if let Some(progress) = self.progress.as_mut() {
                progress.inc(1);
            }
            summary.confirmed += 1;

            if let Some(deleter) = self.deleter.as_mut() {
                deleter.add(BulkOperation::delete(&doc)).await?;
                summary.deletes_queued += 1;
            }
        }

        if let Some(deleter) = self.deleter.as_mut() {
            let stats = deleter.close().await?;
            debug!(requests = stats.requests, failed = stats.failed, "Delete batch closed");
            summary.bulk = Some(stats);
        }
        if let Some(progress) = self.progress.take() {
            progress.finish();
        }

        info!(
            confirmed = summary.confirmed,
            deleted = summary.deletes_queued,
            "Source confirmer finished"
        );
        Ok(summary)
    }
}
