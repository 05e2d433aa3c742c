use async_trait::async_trait;
use engine_core::{
    connectors::{sink::BulkSink, source::DocumentSource},
    error::{SinkError, SourceError},
    metrics::BulkStats,
};
use model::{
    pagination::{cursor::Cursor, page::FetchResult},
    records::{batch::BulkOperation, document::Document},
};
use serde_json::json;
use std::sync::{Arc, Mutex};

pub fn doc(collection: &str, id: &str) -> Document {
    Document::from_value(collection, id, &json!({"id": id})).unwrap()
}

pub fn docs(collection: &str, ids: std::ops::Range<usize>) -> Vec<Document> {
    ids.map(|i| doc(collection, &i.to_string())).collect()
}

/// Serves fixed pages; the cursor carries the index of the next page.
#[derive(Default)]
pub struct PagedSource {
    pub pages: Vec<Vec<Document>>,
    pub fail_at: Option<usize>,
    pub hang_at: Option<usize>,
    pub released: Arc<Mutex<Vec<Cursor>>>,
}

impl PagedSource {
    pub fn new(pages: Vec<Vec<Document>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }
}

#[async_trait]
impl DocumentSource for PagedSource {
    fn name(&self) -> &str {
        "paged"
    }

    async fn fetch(&self, _page_size: usize, cursor: Cursor) -> Result<FetchResult, SourceError> {
        let index = match cursor {
            Cursor::None => 0,
            Cursor::Scroll { id } => id.parse().unwrap(),
        };
        if self.fail_at == Some(index) {
            return Err(SourceError::Fetch(format!("page {index} unavailable")));
        }
        if self.hang_at == Some(index) {
            std::future::pending::<()>().await;
        }
        match self.pages.get(index) {
            Some(page) => Ok(FetchResult::page(
                page.clone(),
                Cursor::scroll((index + 1).to_string()),
            )),
            None => Ok(FetchResult::end()),
        }
    }

    async fn count(&self) -> Result<u64, SourceError> {
        Ok(self.pages.iter().map(Vec::len).sum::<usize>() as u64)
    }

    async fn release(&self, cursor: &Cursor) -> Result<(), SourceError> {
        self.released.lock().unwrap().push(cursor.clone());
        Ok(())
    }
}

/// Keeps every accepted operation in memory.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub accepted: Arc<Mutex<Vec<BulkOperation>>>,
    pub closed: Arc<Mutex<bool>>,
    pub fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Default::default()
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.accepted
            .lock()
            .unwrap()
            .iter()
            .map(|op| op.id().to_string())
            .collect()
    }
}

#[async_trait]
impl BulkSink for RecordingSink {
    async fn add(&mut self, op: BulkOperation) -> Result<(), SinkError> {
        let mut accepted = self.accepted.lock().unwrap();
        if self.fail_after == Some(accepted.len()) {
            return Err(SinkError::Rejected("bulk request failed".into()));
        }
        accepted.push(op);
        Ok(())
    }

    async fn close(&mut self) -> Result<BulkStats, SinkError> {
        *self.closed.lock().unwrap() = true;
        let n = self.accepted.lock().unwrap().len() as u64;
        Ok(BulkStats {
            queued: n,
            requests: 1,
            bytes_sent: 0,
            succeeded: n,
            failed: 0,
        })
    }
}
