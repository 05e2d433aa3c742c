use crate::file::error::FileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// The endpoint string could not be resolved.
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Transport-level failure talking to the store.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The store answered with a body we could not understand.
    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A document could not be encoded into a request.
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// File-related error.
    #[error("File error: {0}")]
    File(#[from] FileError),
}
