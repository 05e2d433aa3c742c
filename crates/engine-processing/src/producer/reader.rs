use crate::{
    error::ProducerError,
    queue::{self, QueueError},
};
use engine_core::connectors::source::DocumentSource;
use model::{pagination::cursor::Cursor, records::document::Document};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pages through a [`DocumentSource`] and emits its documents one at a time.
///
/// The item queue is closed when `run` returns, whatever the outcome.
pub struct SourceReader {
    source: Arc<dyn DocumentSource>,
    page_size: usize,
    items_tx: Option<mpsc::Sender<Document>>,
    cancel: CancellationToken,
}

impl SourceReader {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        page_size: usize,
        items_tx: mpsc::Sender<Document>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            page_size,
            items_tx: Some(items_tx),
            cancel,
        }
    }

    /// Returns the number of documents emitted.
    pub async fn run(&mut self) -> Result<usize, ProducerError> {
        let result = self.stream().await;
        self.close_channel();
        result
    }

    fn close_channel(&mut self) {
        self.items_tx = None;
    }

    async fn stream(&self) -> Result<usize, ProducerError> {
        let tx = self.items_tx.as_ref().ok_or(QueueError::Closed)?;
        let mut cursor = Cursor::None;
        let mut emitted = 0usize;
        let mut pages = 0usize;

        loop {
            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.abandon(&cursor).await;
                    return Err(QueueError::Cancelled.into());
                }
                res = self.source.fetch(self.page_size, cursor.clone()) => res,
            };
            let page = match fetched {
                Ok(page) => page,
                Err(source) => {
                    self.abandon(&cursor).await;
                    return Err(ProducerError::Fetch {
                        cursor: cursor.to_string(),
                        source,
                    });
                }
            };

            pages += 1;
            debug!(
                page = pages,
                documents = page.row_count(),
                took_ms = page.took_ms,
                "Fetched page"
            );

            let next_cursor = page.next_cursor;
            let reached_end = page.reached_end;
            for doc in page.documents {
                if !doc.has_identity() {
                    self.abandon(&next_cursor).await;
                    return Err(ProducerError::MissingIdentity {
                        collection: doc.collection,
                        id: doc.id,
                    });
                }
                if let Err(e) = queue::send(tx, doc, &self.cancel).await {
                    self.abandon(&next_cursor).await;
                    return Err(e.into());
                }
                emitted += 1;
            }

            if reached_end {
                info!(
                    source = self.source.name(),
                    documents = emitted,
                    pages,
                    "Source exhausted"
                );
                return Ok(emitted);
            }
            cursor = next_cursor;
        }
    }

    /// Best-effort release of server-side cursor state on early exit.
    async fn abandon(&self, cursor: &Cursor) {
        if cursor.is_none() {
            return;
        }
        match tokio::time::timeout(RELEASE_TIMEOUT, self.source.release(cursor)).await {
            Ok(Ok(())) => debug!(%cursor, "Released cursor"),
            Ok(Err(e)) => warn!(%cursor, error = %e, "Failed to release cursor"),
            Err(_) => warn!(%cursor, "Timed out releasing cursor"),
        }
    }
}
