use crate::records::document::Document;
use serde_json::value::RawValue;

/// A single pending write against a store.
#[derive(Debug, Clone)]
pub enum BulkOperation {
    /// Create or replace the document under `collection`/`id`.
    Index {
        collection: String,
        kind: Option<String>,
        id: String,
        body: Box<RawValue>,
    },
    /// Remove the document under `collection`/`id`.
    Delete {
        collection: String,
        kind: Option<String>,
        id: String,
    },
}

impl BulkOperation {
    /// Index `doc` into `collection`, which may differ from the document's own.
    pub fn index(doc: &Document, collection: &str) -> Self {
        BulkOperation::Index {
            collection: collection.to_string(),
            kind: doc.kind.clone(),
            id: doc.id.clone(),
            body: doc.body.clone(),
        }
    }

    /// Delete `doc` from the collection it was read from.
    pub fn delete(doc: &Document) -> Self {
        BulkOperation::Delete {
            collection: doc.collection.clone(),
            kind: doc.kind.clone(),
            id: doc.id.clone(),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            BulkOperation::Index { .. } => "index",
            BulkOperation::Delete { .. } => "delete",
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            BulkOperation::Index { collection, .. } | BulkOperation::Delete { collection, .. } => {
                collection
            }
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            BulkOperation::Index { kind, .. } | BulkOperation::Delete { kind, .. } => {
                kind.as_deref()
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            BulkOperation::Index { id, .. } | BulkOperation::Delete { id, .. } => id,
        }
    }

    pub fn body(&self) -> Option<&RawValue> {
        match self {
            BulkOperation::Index { body, .. } => Some(body),
            BulkOperation::Delete { .. } => None,
        }
    }
}
