use crate::error::SourceError;
use async_trait::async_trait;
use model::pagination::{cursor::Cursor, page::FetchResult};

/// A paginated, read-only view over the documents of one collection pattern.
///
/// The cursor returned with each page is handed back unchanged on the next
/// call. Once a result reports `reached_end`, the cursor must not be reused.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, page_size: usize, cursor: Cursor) -> Result<FetchResult, SourceError>;

    /// Total number of documents the stream is expected to produce.
    async fn count(&self) -> Result<u64, SourceError>;

    /// Releases server-side state held for an abandoned cursor.
    async fn release(&self, _cursor: &Cursor) -> Result<(), SourceError> {
        Ok(())
    }
}
