//! The registered entity categories: orders (with array-modelled order items
//! and a shipment sub-processor) and users.

use ripple_core::{id_string, map_to_json, ChangeKind, ChangeRecord};
use serde_json::Value as Json;

use crate::op::{ActionBody, ActionHeader, IndexOperation, Translation};
use crate::processor::{ArraySpec, EntityProcessor};

const ORDER_ARRAY_SPECS: &[ArraySpec] = &[ArraySpec {
    keyword: "ITEM",
    field: "orderItems",
    unique_attr: "itemId",
    parent_id_attr: "orderId",
}];

/// Orders: standalone documents in the `orders` index. Order items live as
/// an array on the order document; shipment records merge into it via the
/// sub-processor.
pub struct OrderProcessor {
    subs: Vec<Box<dyn EntityProcessor>>,
}

impl OrderProcessor {
    pub fn new() -> Self {
        Self { subs: vec![Box::new(ShipmentProcessor)] }
    }
}

impl Default for OrderProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityProcessor for OrderProcessor {
    fn index_name(&self) -> &'static str {
        "orders"
    }

    fn id_field(&self) -> &'static str {
        "orderId"
    }

    fn can_handle(&self, record: &ChangeRecord) -> bool {
        record.key.partition.starts_with("ORDER#")
    }

    fn array_specs(&self) -> &'static [ArraySpec] {
        ORDER_ARRAY_SPECS
    }

    fn sub_processors(&self) -> &[Box<dyn EntityProcessor>] {
        &self.subs
    }
}

/// Users: standalone documents in the `users` index, generic translation
/// only.
pub struct UserProcessor;

impl EntityProcessor for UserProcessor {
    fn index_name(&self) -> &'static str {
        "users"
    }

    fn id_field(&self) -> &'static str {
        "userId"
    }

    fn can_handle(&self, record: &ChangeRecord) -> bool {
        record.key.partition.starts_with("USER#")
    }
}

/// Shipments ride on the order document: the whole shipment snapshot is
/// merged under `shipmentInfo` with `doc_as_upsert`, no script involved.
/// Deletions produce nothing, like any ordinary-entity deletion.
pub struct ShipmentProcessor;

impl EntityProcessor for ShipmentProcessor {
    fn index_name(&self) -> &'static str {
        "orders"
    }

    fn id_field(&self) -> &'static str {
        "orderId"
    }

    fn can_handle(&self, record: &ChangeRecord) -> bool {
        record.key.sort.starts_with("SHIPMENT#")
    }

    fn prepare(&self, record: &ChangeRecord) -> Translation {
        match record.kind {
            ChangeKind::Created | ChangeKind::Updated => {
                let doc_id = id_string(&record.new_image, self.id_field());
                let doc = serde_json::json!({
                    "shipmentInfo": Json::Object(map_to_json(&record.new_image))
                });
                Translation::one(IndexOperation {
                    action: ActionHeader::new(self.index_name(), doc_id),
                    body: ActionBody::Doc { doc, doc_as_upsert: true },
                })
            }
            ChangeKind::Deleted => Translation::none(),
        }
    }
}
