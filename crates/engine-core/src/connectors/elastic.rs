use crate::{
    bulk::{BulkOutcome, BulkTransport},
    connectors::source::DocumentSource,
    error::{SinkError, SourceError},
};
use async_trait::async_trait;
use connectors::elastic::client::ElasticClient;
use model::pagination::{cursor::Cursor, page::FetchResult};
use std::time::Instant;
use tracing::{debug, warn};

/// Individual rejections logged per bulk response; the rest are only counted.
const MAX_LOGGED_REJECTIONS: u64 = 10;

/// Scrolls through every document of a collection pattern.
pub struct ElasticSource {
    client: ElasticClient,
    collection: String,
}

impl ElasticSource {
    pub fn new(client: ElasticClient, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl DocumentSource for ElasticSource {
    fn name(&self) -> &str {
        &self.collection
    }

    async fn fetch(&self, page_size: usize, cursor: Cursor) -> Result<FetchResult, SourceError> {
        let started = Instant::now();
        let resp = match &cursor {
            Cursor::None => self.client.open_scroll(&self.collection, page_size).await?,
            Cursor::Scroll { id } => self.client.continue_scroll(id).await?,
        };
        let took_ms = started.elapsed().as_millis();

        if resp.hits.hits.is_empty() {
            if let Some(id) = resp.scroll_id.as_deref() {
                if let Err(e) = self.client.clear_scroll(id).await {
                    warn!(error = %e, "Failed to clear scroll context");
                }
            }
            debug!(collection = %self.collection, "Scroll exhausted");
            return Ok(FetchResult::end().with_took_ms(took_ms));
        }

        let Some(scroll_id) = resp.scroll_id else {
            return Err(SourceError::Fetch(
                "scroll response carried no scroll id".to_string(),
            ));
        };

        debug!(
            collection = %self.collection,
            hits = resp.hits.hits.len(),
            store_took_ms = resp.took,
            took_ms,
            "Fetched scroll page"
        );
        Ok(FetchResult::page(resp.hits.hits, Cursor::scroll(scroll_id)).with_took_ms(took_ms))
    }

    async fn count(&self) -> Result<u64, SourceError> {
        Ok(self.client.count(&self.collection).await?)
    }

    async fn release(&self, cursor: &Cursor) -> Result<(), SourceError> {
        if let Cursor::Scroll { id } = cursor {
            self.client.clear_scroll(id).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BulkTransport for ElasticClient {
    async fn send(&self, body: Vec<u8>, actions: usize) -> Result<BulkOutcome, SinkError> {
        let resp = self.bulk(body).await?;

        let mut failed = 0;
        for (action, item) in resp.failed_items() {
            failed += 1;
            if failed <= MAX_LOGGED_REJECTIONS {
                warn!(
                    action,
                    index = %item.index,
                    id = %item.id,
                    status = item.status,
                    error = ?item.error,
                    "Bulk item rejected"
                );
            }
        }

        let items = match resp.item_count() {
            0 => actions as u64,
            n => n as u64,
        };
        Ok(BulkOutcome {
            succeeded: items.saturating_sub(failed),
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    fn hit(id: &str) -> serde_json::Value {
        json!({"_index": "logs", "_id": id, "_source": {"id": id}})
    }

    async fn source(server: &MockServer) -> ElasticSource {
        ElasticSource::new(ElasticClient::new(&server.uri(), None).unwrap(), "logs")
    }

    #[tokio::test]
    async fn scrolls_until_empty_page_and_clears() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/logs/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_scroll_id": "s1",
                "hits": {"hits": [hit("a"), hit("b")]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/_search/scroll"))
            .and(body_json(json!({"scroll": "5m", "scroll_id": "s1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_scroll_id": "s2",
                "hits": {"hits": [hit("c")]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/_search/scroll"))
            .and(body_json(json!({"scroll": "5m", "scroll_id": "s2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_scroll_id": "s3",
                "hits": {"hits": []}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/_search/scroll"))
            .and(body_json(json!({"scroll_id": ["s3"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let source = source(&server).await;
        let mut cursor = Cursor::None;
        let mut ids = Vec::new();
        loop {
            let page = source.fetch(2, cursor).await.unwrap();
            ids.extend(page.documents.iter().map(|d| d.id.clone()));
            if page.reached_end {
                break;
            }
            cursor = page.next_cursor;
        }

        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn clear_failure_still_ends_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/logs/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_scroll_id": "s1",
                "hits": {"hits": []}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let page = source(&server).await.fetch(10, Cursor::None).await.unwrap();
        assert!(page.reached_end);
        assert_eq!(page.row_count(), 0);
    }

    #[tokio::test]
    async fn release_clears_open_scroll() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/_search/scroll"))
            .and(body_json(json!({"scroll_id": ["s9"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let source = source(&server).await;
        source.release(&Cursor::scroll("s9")).await.unwrap();
        source.release(&Cursor::None).await.unwrap();
    }

    #[tokio::test]
    async fn transport_counts_rejected_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "took": 2,
                "errors": true,
                "items": [
                    {"delete": {"_index": "logs", "_id": "a", "status": 200}},
                    {"delete": {"_index": "logs", "_id": "b", "status": 404}},
                    {"delete": {"_index": "logs", "_id": "c", "status": 503,
                        "error": {"type": "unavailable_shards_exception"}}}
                ]
            })))
            .mount(&server)
            .await;

        let client = ElasticClient::new(&server.uri(), None).unwrap();
        let outcome = client.send(b"ignored\n".to_vec(), 3).await.unwrap();
        assert_eq!(
            outcome,
            BulkOutcome {
                succeeded: 2,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn transport_status_error_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .respond_with(ResponseTemplate::new(413))
            .mount(&server)
            .await;

        let client = ElasticClient::new(&server.uri(), None).unwrap();
        assert!(matches!(
            client.send(Vec::new(), 0).await,
            Err(SinkError::Adapter(_))
        ));
    }
}
