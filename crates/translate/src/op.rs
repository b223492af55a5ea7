//! Bulk index operations: the (action header, action body) pairs shipped to
//! the index engine, and the translation result that carries them.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Identifies the document an update targets. Wire form:
/// `{"update": {"_index": …, "_id": …}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionHeader {
    pub index: String,
    pub doc_id: String,
}

impl ActionHeader {
    pub fn new(index: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self { index: index.into(), doc_id: doc_id.into() }
    }

    /// Valid for transmission: both the target index and document id are set.
    pub fn is_valid(&self) -> bool {
        !self.index.is_empty() && !self.doc_id.is_empty()
    }

    pub fn to_wire(&self) -> Json {
        serde_json::json!({ "update": { "_index": self.index, "_id": self.doc_id } })
    }
}

/// Server-side update script plus parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateScript {
    pub source: String,
    pub params: serde_json::Map<String, Json>,
    pub lang: String,
}

impl UpdateScript {
    pub fn painless(source: String, params: serde_json::Map<String, Json>) -> Self {
        Self { source, params, lang: "painless".to_string() }
    }
}

/// Body of one update action: either a script (optionally seeded with an
/// upsert document) or a raw document fragment merged with `doc_as_upsert`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ActionBody {
    Script {
        script: UpdateScript,
        #[serde(skip_serializing_if = "Option::is_none")]
        upsert: Option<Json>,
    },
    Doc {
        doc: Json,
        doc_as_upsert: bool,
    },
}

/// One bulk operation pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexOperation {
    pub action: ActionHeader,
    pub body: ActionBody,
}

/// Render operations as the NDJSON bulk body (header line, body line, …).
pub fn render_bulk_body(ops: &[IndexOperation]) -> serde_json::Result<String> {
    let mut out = String::new();
    for op in ops {
        out.push_str(&serde_json::to_string(&op.action.to_wire())?);
        out.push('\n');
        out.push_str(&serde_json::to_string(&op.body)?);
        out.push('\n');
    }
    Ok(out)
}

/// Result of translating one change record. The flush signal is an explicit
/// return value so nothing stateful leaks across records.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    pub operation: Option<IndexOperation>,
    /// Flush the batch right after this record regardless of size, when
    /// ordering against later records cannot be guaranteed within one batch.
    pub flush_after: bool,
}

impl Translation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn one(operation: IndexOperation) -> Self {
        Self { operation: Some(operation), flush_after: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_validity_requires_index_and_id() {
        assert!(ActionHeader::new("orders", "123").is_valid());
        assert!(!ActionHeader::new("", "123").is_valid());
        assert!(!ActionHeader::new("orders", "").is_valid());
    }

    #[test]
    fn header_wire_shape() {
        let h = ActionHeader::new("orders", "123");
        assert_eq!(
            h.to_wire(),
            serde_json::json!({ "update": { "_index": "orders", "_id": "123" } })
        );
    }

    #[test]
    fn doc_body_serializes_flat() {
        let body = ActionBody::Doc {
            doc: serde_json::json!({ "shipmentInfo": { "carrier": "acme" } }),
            doc_as_upsert: true,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "doc": { "shipmentInfo": { "carrier": "acme" } },
                "doc_as_upsert": true
            })
        );
    }

    #[test]
    fn script_body_omits_missing_upsert() {
        let body = ActionBody::Script {
            script: UpdateScript::painless("noop".into(), serde_json::Map::new()),
            upsert: None,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert!(v.get("upsert").is_none());
        assert_eq!(v["script"]["lang"], "painless");
    }

    #[test]
    fn bulk_body_is_line_per_half() {
        let op = IndexOperation {
            action: ActionHeader::new("orders", "1"),
            body: ActionBody::Doc { doc: serde_json::json!({}), doc_as_upsert: true },
        };
        let body = render_bulk_body(&[op]).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"_index\":\"orders\""));
        assert!(lines[1].contains("doc_as_upsert"));
    }
}
