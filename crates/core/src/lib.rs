//! Ripple core types: change records as delivered by the source change stream.

#![forbid(unsafe_code)]

pub mod attr;

use serde::{Deserialize, Serialize};

pub use attr::{deep_equal, id_string, map_to_json, Attr, AttrMap};

/// Kind of mutation captured from the source change stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Partition/sort key pair identifying the mutated item.
///
/// The partition key carries the entity type (`ORDER#123`), the sort key the
/// sub-entity type (`ITEM#1`). Classification reads nothing else.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeKey {
    pub partition: String,
    #[serde(default)]
    pub sort: String,
}

/// One captured mutation: event kind, item key, before/after images and the
/// item size as reported by the stream.
///
/// For `Created`/`Updated` the new image is non-empty; for `Deleted` the old
/// image is. Images keep the stream's attribute encoding (see [`Attr`]) so
/// set-typed fields survive until translation applies set semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub key: ChangeKey,
    #[serde(default)]
    pub old_image: AttrMap,
    #[serde(default)]
    pub new_image: AttrMap,
    /// Approximate item size in bytes, used as a proxy for the size of the
    /// operation this record translates into.
    #[serde(default)]
    pub size_bytes: u64,
}

pub mod prelude {
    pub use super::attr::{deep_equal, id_string, map_to_json, Attr, AttrMap};
    pub use super::{ChangeKey, ChangeKind, ChangeRecord};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_parses_from_stream_shaped_json() {
        let raw = serde_json::json!({
            "kind": "Created",
            "key": { "partition": "ORDER#123", "sort": "ORDER#123" },
            "new_image": {
                "orderId": { "S": "123" },
                "total": { "N": "99.5" },
                "tags": { "SS": ["b", "a"] }
            },
            "size_bytes": 256
        });
        let rec: ChangeRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(rec.kind, ChangeKind::Created);
        assert_eq!(rec.key.partition, "ORDER#123");
        assert!(rec.old_image.is_empty());
        assert_eq!(rec.new_image.len(), 3);
        assert_eq!(rec.size_bytes, 256);
        match rec.new_image.get("tags") {
            Some(Attr::StrSet(v)) => assert_eq!(v.len(), 2),
            other => panic!("expected string set, got {other:?}"),
        }
    }

    #[test]
    fn images_default_to_empty() {
        let raw = serde_json::json!({
            "kind": "Deleted",
            "key": { "partition": "USER#9" }
        });
        let rec: ChangeRecord = serde_json::from_value(raw).unwrap();
        assert!(rec.old_image.is_empty());
        assert!(rec.new_image.is_empty());
        assert_eq!(rec.size_bytes, 0);
        assert_eq!(rec.key.sort, "");
    }
}
