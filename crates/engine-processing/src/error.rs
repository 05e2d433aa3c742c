use crate::queue::QueueError;
use connectors::file::error::FileError;
use engine_core::error::{SinkError, SourceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("Fetch failed at cursor {cursor}: {source}")]
    Fetch {
        cursor: String,
        #[source]
        source: SourceError,
    },

    #[error("Document without identity in collection '{collection}' (id '{id}')")]
    MissingIdentity { collection: String, id: String },

    #[error("Source reader stopped: {0}")]
    Queue(#[from] QueueError),
}

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Failed to write to destination: {0}")]
    Sink(#[from] SinkError),

    #[error("Failed to write output file: {0}")]
    File(#[from] FileError),

    #[error("Destination writer stopped: {0}")]
    Queue(#[from] QueueError),
}

#[derive(Error, Debug)]
pub enum ConfirmerError {
    #[error("Failed to delete from source: {0}")]
    Sink(#[from] SinkError),

    #[error("Source confirmer stopped: {0}")]
    Queue(#[from] QueueError),
}

impl ProducerError {
    /// The stage stopped because another one failed or the run was cancelled.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ProducerError::Queue(_))
    }
}

impl ConsumerError {
    pub fn is_cancellation(&self) -> bool {
        match self {
            ConsumerError::Queue(_) => true,
            ConsumerError::Sink(e) => e.is_cancellation(),
            ConsumerError::File(_) => false,
        }
    }
}

impl ConfirmerError {
    pub fn is_cancellation(&self) -> bool {
        match self {
            ConfirmerError::Queue(_) => true,
            ConfirmerError::Sink(e) => e.is_cancellation(),
        }
    }
}
