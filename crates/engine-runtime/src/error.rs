use connectors::{error::AdapterError, file::error::FileError};
use engine_core::error::SourceError;
use engine_processing::error::{ConfirmerError, ConsumerError, ProducerError};
use thiserror::Error;

/// Top‐level errors for a dump run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Invalid or missing configuration. Raised before any stage starts.
    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),

    /// Adapter-related error.
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Output file error: {0}")]
    File(#[from] FileError),

    #[error(transparent)]
    Producer(#[from] ProducerError),

    #[error(transparent)]
    Consumer(#[from] ConsumerError),

    #[error(transparent)]
    Confirmer(#[from] ConfirmerError),

    /// A stage panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// The run was interrupted before any stage failed.
    #[error("Dump cancelled")]
    Cancelled,
}

impl MigrationError {
    /// Errors a stage returns because the run was already being torn down.
    pub fn is_cancellation(&self) -> bool {
        match self {
            MigrationError::Producer(e) => e.is_cancellation(),
            MigrationError::Consumer(e) => e.is_cancellation(),
            MigrationError::Confirmer(e) => e.is_cancellation(),
            MigrationError::Cancelled => true,
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("empty config \"{0}\"")]
    Empty(&'static str),

    #[error("file input not supported")]
    FileInput,

    #[error("scroll size must be greater than zero")]
    ZeroPageSize,

    #[error("bulk size of {0} MiB does not fit in memory")]
    BulkSizeTooLarge(usize),

    #[error(transparent)]
    Endpoint(#[from] AdapterError),
}
