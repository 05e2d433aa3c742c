use connectors::error::AdapterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Fetch failed: {0}")]
    Fetch(String),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Failed to encode bulk operation: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Bulk request rejected: {0}")]
    Rejected(String),

    #[error("Bulk processor '{0}' is closed")]
    Closed(String),

    #[error("Bulk processor '{0}' was cancelled")]
    Cancelled(String),
}

impl SinkError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SinkError::Cancelled(_))
    }
}
