use crate::{
    elastic::{
        requests::{ClearScrollRequest, ContinueScrollRequest, OpenScrollRequest, SCROLL_KEEP_ALIVE},
        response::{BulkResponse, CountResponse, ScrollResponse},
    },
    error::AdapterError,
};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    /// Credentials are only sent when at least one part is non-empty.
    pub fn from_parts(username: &str, password: &str) -> Option<Self> {
        if username.is_empty() && password.is_empty() {
            return None;
        }
        Some(BasicAuth {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Thin HTTP client for the scroll, count and bulk APIs.
#[derive(Debug, Clone)]
pub struct ElasticClient {
    http: Client,
    base: Url,
    auth: Option<BasicAuth>,
}

impl ElasticClient {
    pub fn new(base_url: &str, auth: Option<BasicAuth>) -> Result<Self, AdapterError> {
        let mut base = Url::parse(base_url).map_err(|e| AdapterError::InvalidEndpoint {
            endpoint: base_url.to_string(),
            reason: e.to_string(),
        })?;
        base.set_fragment(None);

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(ElasticClient { http, base, auth })
    }

    /// Number of documents matching the collection pattern.
    pub async fn count(&self, index: &str) -> Result<u64, AdapterError> {
        let url = self.url(&index_path(index, "_count"), &[]);
        let resp = self.execute("count", self.http.get(url)).await?;
        let body: CountResponse = decode("count", resp).await?;
        Ok(body.count)
    }

    pub async fn open_scroll(
        &self,
        index: &str,
        size: usize,
    ) -> Result<ScrollResponse, AdapterError> {
        let url = self.url(
            &index_path(index, "_search"),
            &[("scroll", SCROLL_KEEP_ALIVE)],
        );
        let req = self.http.post(url).json(&OpenScrollRequest::new(size));
        let resp = self.execute("scroll", req).await?;
        decode("scroll", resp).await
    }

    pub async fn continue_scroll(&self, scroll_id: &str) -> Result<ScrollResponse, AdapterError> {
        let url = self.url("/_search/scroll", &[]);
        let req = self.http.post(url).json(&ContinueScrollRequest {
            scroll: SCROLL_KEEP_ALIVE,
            scroll_id,
        });
        let resp = self.execute("scroll", req).await?;
        decode("scroll", resp).await
    }

    pub async fn clear_scroll(&self, scroll_id: &str) -> Result<(), AdapterError> {
        let url = self.url("/_search/scroll", &[]);
        let req = self.http.delete(url).json(&ClearScrollRequest {
            scroll_id: [scroll_id],
        });
        self.execute("clear scroll", req).await?;
        Ok(())
    }

    /// Sends an NDJSON bulk body. Per-item failures are reported in the
    /// response, not as an error.
    pub async fn bulk(&self, body: Vec<u8>) -> Result<BulkResponse, AdapterError> {
        let url = self.url("/_bulk", &[]);
        let req = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        let resp = self.execute("bulk", req).await?;
        decode("bulk", resp).await
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    async fn execute(
        &self,
        operation: &'static str,
        req: RequestBuilder,
    ) -> Result<Response, AdapterError> {
        let req = match &self.auth {
            Some(auth) => req.basic_auth(&auth.username, Some(&auth.password)),
            None => req,
        };

        let resp = req.send().await?;
        let status = resp.status();
        debug!(operation, status = status.as_u16(), "Store responded");

        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AdapterError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

fn index_path(index: &str, api: &str) -> String {
    if index.is_empty() {
        format!("/{api}")
    } else {
        format!("/{index}/{api}")
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    resp: Response,
) -> Result<T, AdapterError> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| AdapterError::Decode { operation, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    #[test]
    fn auth_needs_a_non_empty_part() {
        assert_eq!(BasicAuth::from_parts("", ""), None);
        assert!(BasicAuth::from_parts("", "secret").is_some());
        assert!(BasicAuth::from_parts("elastic", "").is_some());
    }

    #[tokio::test]
    async fn opens_scroll_on_collection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/logs-*/_search"))
            .and(query_param("scroll", "5m"))
            .and(body_json(json!({"size": 2, "sort": ["_doc"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_scroll_id": "s1",
                "took": 4,
                "hits": {"hits": [
                    {"_index": "logs-1", "_id": "a", "_source": {"n": 1}},
                    {"_index": "logs-2", "_id": "b", "_source": {"n": 2}}
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ElasticClient::new(&server.uri(), None).unwrap();
        let resp = client.open_scroll("logs-*", 2).await.unwrap();

        assert_eq!(resp.scroll_id.as_deref(), Some("s1"));
        assert_eq!(resp.took, 4);
        let ids: Vec<_> = resp.hits.hits.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn continues_and_clears_scroll() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_search/scroll"))
            .and(body_json(json!({"scroll": "5m", "scroll_id": "s1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_scroll_id": "s2",
                "hits": {"hits": []}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/_search/scroll"))
            .and(body_json(json!({"scroll_id": ["s2"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"succeeded": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ElasticClient::new(&server.uri(), None).unwrap();
        let resp = client.continue_scroll("s1").await.unwrap();
        assert!(resp.hits.hits.is_empty());
        client.clear_scroll("s2").await.unwrap();
    }

    #[tokio::test]
    async fn count_without_collection_hits_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_count"))
            .and(header("authorization", "Basic dTpw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 12})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ElasticClient::new(&server.uri(), BasicAuth::from_parts("u", "p")).unwrap();
        assert_eq!(client.count("").await.unwrap(), 12);
    }

    #[tokio::test]
    async fn bulk_sends_ndjson() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .and(header("content-type", "application/x-ndjson"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "took": 1,
                "errors": false,
                "items": [{"index": {"_index": "a", "_id": "1", "status": 201}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ElasticClient::new(&server.uri(), None).unwrap();
        let body = b"{\"index\":{\"_index\":\"a\",\"_id\":\"1\"}}\n{}\n".to_vec();
        let resp = client.bulk(body).await.unwrap();
        assert_eq!(resp.item_count(), 1);
        assert_eq!(resp.failed_items().count(), 0);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/missing/_search"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such index"))
            .mount(&server)
            .await;

        let client = ElasticClient::new(&server.uri(), None).unwrap();
        let err = client.open_scroll("missing", 10).await.unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Status { operation: "scroll", status: 404, .. }
        ));
    }

    #[test]
    fn rejects_unparseable_base() {
        assert!(matches!(
            ElasticClient::new("not a url", None),
            Err(AdapterError::InvalidEndpoint { .. })
        ));
    }
}
