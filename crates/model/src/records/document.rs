use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// A stored document together with its addressing metadata.
///
/// The body is kept as raw JSON so it is copied byte-for-byte between stores.
/// Field names follow the hit layout returned by the store, which is also the
/// line format used for file dumps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_index")]
    pub collection: String,

    /// Mapping type of legacy multi-type indices.
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_source", default = "null_body")]
    pub body: Box<RawValue>,

    /// Per-hit sort values. Only meaningful inside the page it came from.
    #[serde(default, skip_serializing)]
    pub sort: Option<Vec<serde_json::Value>>,
}

fn null_body() -> Box<RawValue> {
    RawValue::NULL.to_owned()
}

impl Document {
    pub fn new(
        collection: impl Into<String>,
        kind: Option<String>,
        id: impl Into<String>,
        body: Box<RawValue>,
    ) -> Self {
        Document {
            collection: collection.into(),
            kind,
            id: id.into(),
            body,
            sort: None,
        }
    }

    /// Builds a document from an in-memory JSON value.
    pub fn from_value(
        collection: impl Into<String>,
        id: impl Into<String>,
        body: &serde_json::Value,
    ) -> serde_json::Result<Self> {
        let body = serde_json::value::to_raw_value(body)?;
        Ok(Document::new(collection, None, id, body))
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Both the id and the collection are set.
    pub fn has_identity(&self) -> bool {
        !self.id.is_empty() && !self.collection.is_empty()
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.collection == other.collection
            && self.kind == other.kind
            && self.id == other.id
            && self.body.get() == other.body.get()
    }
}
