use crate::{pagination::cursor::Cursor, records::document::Document};

/// One page returned by a paginated source.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub documents: Vec<Document>,
    /// Cursor to hand to the next fetch. Meaningless once `reached_end` is set.
    pub next_cursor: Cursor,
    /// The source has no further pages. Documents in this result are still valid.
    pub reached_end: bool,
    pub took_ms: u128,
}

impl FetchResult {
    pub fn page(documents: Vec<Document>, next_cursor: Cursor) -> Self {
        FetchResult {
            documents,
            next_cursor,
            reached_end: false,
            took_ms: 0,
        }
    }

    pub fn end() -> Self {
        FetchResult {
            documents: Vec::new(),
            next_cursor: Cursor::None,
            reached_end: true,
            took_ms: 0,
        }
    }

    pub fn with_took_ms(mut self, took_ms: u128) -> Self {
        self.took_ms = took_ms;
        self
    }

    pub fn row_count(&self) -> usize {
        self.documents.len()
    }
}
