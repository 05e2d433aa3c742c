use async_trait::async_trait;
use engine_core::{
    connectors::{sink::BulkSink, source::DocumentSource},
    error::{SinkError, SourceError},
    metrics::BulkStats,
};
use flate2::read::GzDecoder;
use model::{
    pagination::{cursor::Cursor, page::FetchResult},
    records::{batch::BulkOperation, document::Document},
};
use serde_json::{Value, json};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
    sync::{Arc, Mutex},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// A document store kept in memory, shared by every source and sink made from it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    /// Inserts `count` documents with ids `doc-0000`, `doc-0001`, ...
    pub fn seed(&self, collection: &str, count: usize) {
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        for i in 0..count {
            docs.insert(
                format!("doc-{i:04}"),
                json!({ "seq": i, "message": format!("event {i}") }),
            );
        }
    }

    pub fn documents(&self, collection: &str) -> Vec<(String, Value)> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|docs| docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.documents(collection).len()
    }

    pub fn source(&self, collection: &str) -> MemorySource {
        MemorySource {
            store: self.clone(),
            collection: collection.to_string(),
            snapshot: Mutex::new(None),
        }
    }

    pub fn sink(&self) -> MemorySink {
        MemorySink {
            store: self.clone(),
            fail_after: None,
            accepted: Arc::new(Mutex::new(0)),
        }
    }

    /// A sink that rejects every operation after the first `n`.
    pub fn failing_sink(&self, n: usize) -> MemorySink {
        MemorySink {
            fail_after: Some(n),
            ..self.sink()
        }
    }

    fn apply(&self, op: &BulkOperation) -> Result<(), SinkError> {
        let mut collections = self.collections.lock().unwrap();
        match op {
            BulkOperation::Index { .. } => {
                let body = op
                    .body()
                    .map(|raw| serde_json::from_str(raw.get()))
                    .transpose()?
                    .unwrap_or(Value::Null);
                collections
                    .entry(op.collection().to_string())
                    .or_default()
                    .insert(op.id().to_string(), body);
            }
            BulkOperation::Delete { .. } => {
                if let Some(docs) = collections.get_mut(op.collection()) {
                    docs.remove(op.id());
                }
            }
        }
        Ok(())
    }
}

/// Pages over a point-in-time copy of one collection, taken on the first fetch.
pub struct MemorySource {
    store: MemoryStore,
    collection: String,
    snapshot: Mutex<Option<Vec<Document>>>,
}

#[async_trait]
impl DocumentSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, page_size: usize, cursor: Cursor) -> Result<FetchResult, SourceError> {
        let offset = match &cursor {
            Cursor::None => 0,
            Cursor::Scroll { id } => id
                .parse::<usize>()
                .map_err(|e| SourceError::Fetch(e.to_string()))?,
        };

        let mut snapshot = self.snapshot.lock().unwrap();
        if cursor.is_none() {
            let docs = self
                .store
                .documents(&self.collection)
                .into_iter()
                .map(|(id, body)| Document::from_value(self.collection.clone(), id, &body))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| SourceError::Fetch(e.to_string()))?;
            *snapshot = Some(docs);
        }

        let docs = snapshot.as_ref().map(Vec::as_slice).unwrap_or_default();
        let page: Vec<Document> = docs.iter().skip(offset).take(page_size).cloned().collect();
        if page.is_empty() {
            return Ok(FetchResult::end());
        }
        let next = offset + page.len();
        Ok(FetchResult::page(page, Cursor::scroll(next.to_string())))
    }

    async fn count(&self) -> Result<u64, SourceError> {
        Ok(self.store.len(&self.collection) as u64)
    }
}

/// Applies operations to the store as soon as they are added.
#[derive(Clone)]
pub struct MemorySink {
    store: MemoryStore,
    fail_after: Option<usize>,
    accepted: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn accepted(&self) -> usize {
        *self.accepted.lock().unwrap()
    }
}

#[async_trait]
impl BulkSink for MemorySink {
    async fn add(&mut self, op: BulkOperation) -> Result<(), SinkError> {
        let mut accepted = self.accepted.lock().unwrap();
        if self.fail_after == Some(*accepted) {
            return Err(SinkError::Rejected(format!(
                "store refused {} of {}",
                op.action(),
                op.id()
            )));
        }
        self.store.apply(&op)?;
        *accepted += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<BulkStats, SinkError> {
        let n = self.accepted() as u64;
        Ok(BulkStats {
            queued: n,
            requests: n.div_ceil(10),
            bytes_sent: 0,
            succeeded: n,
            failed: 0,
        })
    }
}

/// Reads a newline-delimited JSON file, decompressing it when it ends in `.gz`.
pub fn read_records(path: &Path) -> Vec<Value> {
    let file = File::open(path).unwrap();
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    BufReader::new(reader)
        .lines()
        .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
        .collect()
}

/// A store hit as returned inside a scroll page.
pub fn hit(index: &str, id: usize) -> Value {
    json!({
        "_index": index,
        "_type": "_doc",
        "_id": id.to_string(),
        "_score": null,
        "_source": { "seq": id },
        "sort": [id]
    })
}

/// Serves `hits` as a single scroll page of `index`, followed by an empty one.
pub async fn mount_scroll(server: &MockServer, index: &str, hits: Vec<Value>) {
    let total = hits.len();

    Mock::given(method("GET"))
        .and(path(format!("/{index}/_count")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": total })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/{index}/_search")))
        .and(query_param("scroll", "5m"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_scroll_id": "scroll-1",
            "took": 2,
            "hits": { "total": total, "hits": hits }
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_scroll_id": "scroll-1",
            "took": 1,
            "hits": { "hits": [] }
        })))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/_search/scroll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "succeeded": true })))
        .mount(server)
        .await;
}

/// Accepts every bulk request without per-item errors.
pub async fn mount_bulk(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 1,
            "errors": false,
            "items": []
        })))
        .mount(server)
        .await;
}

/// Action lines of every bulk request the server received, as `(action, index, id)`.
pub async fn bulk_actions(server: &MockServer) -> Vec<(String, String, String)> {
    let requests = server.received_requests().await.unwrap_or_default();
    let mut actions = Vec::new();
    for request in requests.iter().filter(|r| r.url.path() == "/_bulk") {
        let body = String::from_utf8_lossy(&request.body);
        let mut lines = body.lines();
        while let Some(line) = lines.next() {
            let value: Value = serde_json::from_str(line).unwrap();
            let (action, meta) = value.as_object().unwrap().iter().next().unwrap();
            if action == "index" {
                // document body
                lines.next();
            }
            actions.push((
                action.clone(),
                meta["_index"].as_str().unwrap_or_default().to_string(),
                meta["_id"].as_str().unwrap_or_default().to_string(),
            ));
        }
    }
    actions
}
