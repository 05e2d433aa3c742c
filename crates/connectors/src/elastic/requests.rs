use crate::json::write_json_line;
use model::records::batch::BulkOperation;
use serde::Serialize;

/// Keep-alive requested on every scroll round trip.
pub const SCROLL_KEEP_ALIVE: &str = "5m";

#[derive(Debug, Serialize)]
pub(crate) struct OpenScrollRequest {
    pub size: usize,
    pub sort: [&'static str; 1],
}

impl OpenScrollRequest {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            sort: ["_doc"],
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ContinueScrollRequest<'a> {
    pub scroll: &'static str,
    pub scroll_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClearScrollRequest<'a> {
    pub scroll_id: [&'a str; 1],
}

#[derive(Debug, Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
    #[serde(rename = "_id")]
    id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum ActionLine<'a> {
    Index(ActionMeta<'a>),
    Delete(ActionMeta<'a>),
}

/// Appends the NDJSON lines of one bulk operation to `buf`.
pub fn encode_operation(op: &BulkOperation, buf: &mut Vec<u8>) -> Result<(), serde_json::Error> {
    let meta = ActionMeta {
        index: op.collection(),
        kind: op.kind().filter(|k| !k.is_empty()),
        id: op.id(),
    };

    match op {
        BulkOperation::Index { body, .. } => {
            write_json_line(buf, &ActionLine::Index(meta))?;
            write_json_line(buf, body)
        }
        BulkOperation::Delete { .. } => write_json_line(buf, &ActionLine::Delete(meta)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::records::document::Document;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value("logs", "1", &json!({"msg": "hi"})).unwrap()
    }

    #[test]
    fn encodes_index_action_with_body() {
        let mut buf = Vec::new();
        encode_operation(&BulkOperation::index(&doc(), "copy"), &mut buf).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"index\":{\"_index\":\"copy\",\"_id\":\"1\"}}\n{\"msg\":\"hi\"}\n"
        );
    }

    #[test]
    fn encodes_delete_action_with_legacy_type() {
        let mut buf = Vec::new();
        let doc = doc().with_kind("event");
        encode_operation(&BulkOperation::delete(&doc), &mut buf).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"delete\":{\"_index\":\"logs\",\"_type\":\"event\",\"_id\":\"1\"}}\n"
        );
    }

    #[test]
    fn scroll_requests_serialize() {
        let open = serde_json::to_value(OpenScrollRequest::new(50)).unwrap();
        assert_eq!(open, json!({"size": 50, "sort": ["_doc"]}));

        let next = serde_json::to_value(ContinueScrollRequest {
            scroll: SCROLL_KEEP_ALIVE,
            scroll_id: "abc",
        })
        .unwrap();
        assert_eq!(next, json!({"scroll": "5m", "scroll_id": "abc"}));

        let clear = serde_json::to_value(ClearScrollRequest { scroll_id: ["abc"] }).unwrap();
        assert_eq!(clear, json!({"scroll_id": ["abc"]}));
    }
}
