use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("Failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write record to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to close {}: {source}", path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File sink already closed")]
    Closed,
}
