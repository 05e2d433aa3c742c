use model::records::document::Document;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Response to opening or continuing a scroll.
#[derive(Debug, Deserialize)]
pub struct ScrollResponse {
    #[serde(rename = "_scroll_id", default)]
    pub scroll_id: Option<String>,
    #[serde(default)]
    pub took: u64,
    pub hits: ScrollHits,
}

#[derive(Debug, Deserialize)]
pub struct ScrollHits {
    #[serde(default)]
    pub hits: Vec<Document>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub errors: bool,
    /// One single-key map per operation, keyed by the action name.
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl BulkItem {
    /// Deleting a document that is already gone is not a failure.
    pub fn is_failure(&self, action: &str) -> bool {
        if action == "delete" && self.status == 404 {
            return false;
        }
        self.error.is_some() || !(200..300).contains(&self.status)
    }
}

impl BulkResponse {
    /// Items the store rejected, as `(action, item)` pairs.
    pub fn failed_items(&self) -> impl Iterator<Item = (&str, &BulkItem)> {
        self.items
            .iter()
            .flat_map(|entry| entry.iter())
            .filter(|(action, item)| item.is_failure(action))
            .map(|(action, item)| (action.as_str(), item))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
