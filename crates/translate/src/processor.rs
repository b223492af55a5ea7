//! The entity-processor contract and the generic change translation shared
//! by every ordinary entity.

use ripple_core::{id_string, map_to_json, Attr, AttrMap, ChangeKind, ChangeRecord};
use serde_json::Value as Json;

use crate::diff::diff_images;
use crate::op::{ActionBody, ActionHeader, IndexOperation, Translation, UpdateScript};
use crate::script;

/// A sub-entity stored as items inside an array field of its parent's
/// document rather than as a standalone document. Matched when `keyword`
/// appears in the record's sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArraySpec {
    pub keyword: &'static str,
    /// Array field on the parent document, e.g. `orderItems`.
    pub field: &'static str,
    /// Attribute uniquely identifying items within the array.
    pub unique_attr: &'static str,
    /// Attribute carrying the parent document id.
    pub parent_id_attr: &'static str,
}

/// One entity category. `can_handle` must stay pure and total; all state a
/// translation needs travels in the record and the returned [`Translation`].
pub trait EntityProcessor: Send + Sync {
    fn index_name(&self) -> &'static str;

    /// Image attribute used as the document `_id` for this entity.
    fn id_field(&self) -> &'static str;

    /// Whether this processor owns the record, decided from the key alone.
    fn can_handle(&self, record: &ChangeRecord) -> bool;

    /// Array-modelled sub-entities, scanned in order against the sort key.
    fn array_specs(&self) -> &'static [ArraySpec] {
        &[]
    }

    /// More specific processors consulted before the generic translation;
    /// the first claimer wins. One level deep, never nested further.
    fn sub_processors(&self) -> &[Box<dyn EntityProcessor>] {
        &[]
    }

    fn prepare(&self, record: &ChangeRecord) -> Translation {
        if let Some(sub) = self.sub_processors().iter().find(|s| s.can_handle(record)) {
            return sub.prepare(record);
        }
        translate_record(self, record)
    }
}

/// Generic translation: dispatch on event kind and on whether the sort key
/// names an array-modelled sub-entity.
pub fn translate_record<P>(processor: &P, record: &ChangeRecord) -> Translation
where
    P: EntityProcessor + ?Sized,
{
    match record.kind {
        ChangeKind::Created | ChangeKind::Updated => {
            match match_array_spec(processor.array_specs(), &record.key.sort) {
                Some(spec) => array_append_op(processor, spec, &record.new_image),
                None => field_update_op(processor, record),
            }
        }
        ChangeKind::Deleted => {
            match match_array_spec(processor.array_specs(), &record.key.sort) {
                Some(spec) => array_remove_op(processor, spec, &record.old_image),
                // Whole-document purges belong to a separate process; the
                // translation layer never emits a delete action.
                None => Translation::none(),
            }
        }
    }
}

fn match_array_spec(specs: &'static [ArraySpec], sort_key: &str) -> Option<&'static ArraySpec> {
    specs.iter().find(|spec| sort_key.contains(spec.keyword))
}

/// Diff-based field update with the full new image as upsert seed.
fn field_update_op<P>(processor: &P, record: &ChangeRecord) -> Translation
where
    P: EntityProcessor + ?Sized,
{
    let doc_id = id_string(&record.new_image, processor.id_field());
    let diff = diff_images(&record.old_image, &record.new_image);
    let source = script::field_update_script(
        diff.set.iter().map(|(k, _)| k.as_str()),
        diff.removed.iter().map(String::as_str),
    );
    let params: serde_json::Map<String, Json> = diff.set.into_iter().collect();
    let upsert = Json::Object(map_to_json(&record.new_image));
    Translation::one(IndexOperation {
        action: ActionHeader::new(processor.index_name(), doc_id),
        body: ActionBody::Script {
            script: UpdateScript::painless(source, params),
            upsert: Some(upsert),
        },
    })
}

/// Append the item snapshot to the parent's array field, seeding the parent
/// document when it does not exist yet. Replays append duplicates; only the
/// removal path matches by unique attribute.
fn array_append_op<P>(processor: &P, spec: &ArraySpec, image: &AttrMap) -> Translation
where
    P: EntityProcessor + ?Sized,
{
    let doc_id = id_string(image, spec.parent_id_attr);
    let item = Json::Object(map_to_json(image));

    let mut params = serde_json::Map::new();
    params.insert("item".to_string(), item.clone());

    let mut seed = serde_json::Map::new();
    seed.insert(
        spec.parent_id_attr.to_string(),
        image.get(spec.parent_id_attr).map(Attr::to_json).unwrap_or(Json::Null),
    );
    seed.insert(spec.field.to_string(), Json::Array(vec![item]));

    Translation::one(IndexOperation {
        action: ActionHeader::new(processor.index_name(), doc_id),
        body: ActionBody::Script {
            script: UpdateScript::painless(script::array_append_script(spec.field), params),
            upsert: Some(Json::Object(seed)),
        },
    })
}

/// Filter the deleted item out of the parent's array field by its unique
/// attribute. No upsert seed: a parent that does not exist has nothing to
/// remove.
fn array_remove_op<P>(processor: &P, spec: &ArraySpec, old_image: &AttrMap) -> Translation
where
    P: EntityProcessor + ?Sized,
{
    let doc_id = id_string(old_image, spec.parent_id_attr);
    let unique = old_image.get(spec.unique_attr).map(Attr::to_json).unwrap_or(Json::Null);

    let mut params = serde_json::Map::new();
    params.insert("uniqueId".to_string(), unique);

    Translation::one(IndexOperation {
        action: ActionHeader::new(processor.index_name(), doc_id),
        body: ActionBody::Script {
            script: UpdateScript::painless(
                script::array_remove_script(spec.field, spec.unique_attr),
                params,
            ),
            upsert: None,
        },
    })
}
