use crate::error::ConsumerError;
use connectors::file::sink::FileSink;
use engine_core::{connectors::sink::BulkSink, metrics::BulkStats};
use model::records::{batch::BulkOperation, document::Document};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Where the destination writer puts documents. One kind per run.
pub enum WriteTarget {
    Store {
        sink: Box<dyn BulkSink>,
        /// Replaces each document's own collection when set.
        collection_override: Option<String>,
    },
    File(FileSink),
}

/// What a target reports once it has been closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetReport {
    #[default]
    None,
    Store(BulkStats),
    Files(Vec<PathBuf>),
}

impl WriteTarget {
    pub fn store(sink: Box<dyn BulkSink>, collection_override: impl Into<String>) -> Self {
        let collection_override = collection_override.into();
        WriteTarget::Store {
            sink,
            collection_override: (!collection_override.is_empty()).then_some(collection_override),
        }
    }

    /// Hands `doc` to the store's batch or appends it to the current file.
    pub async fn write(&mut self, doc: &Document) -> Result<(), ConsumerError> {
        match self {
            WriteTarget::Store {
                sink,
                collection_override,
            } => {
                let collection = collection_override.as_deref().unwrap_or(&doc.collection);
                sink.add(BulkOperation::index(doc, collection)).await?;
            }
            WriteTarget::File(file) => file.write(doc)?,
        }
        Ok(())
    }

    pub async fn close(&mut self) -> Result<TargetReport, ConsumerError> {
        match self {
            WriteTarget::Store { sink, .. } => Ok(TargetReport::Store(sink.close().await?)),
            WriteTarget::File(file) => {
                file.finish()?;
                Ok(TargetReport::Files(file.files().to_vec()))
            }
        }
    }

    /// Flushes what was accepted so far after a failure. Errors are only logged.
    ///
    /// A store batch is dropped instead once the run is cancelled. Files are
    /// always finished.
    pub async fn close_after_failure(&mut self, cancel: &CancellationToken) {
        if cancel.is_cancelled() && matches!(self, WriteTarget::Store { .. }) {
            debug!("Run cancelled, dropping pending destination batch");
            return;
        }
        if let Err(e) = self.close().await {
            warn!(error = %e, "Failed to flush destination after error");
        }
    }
}
