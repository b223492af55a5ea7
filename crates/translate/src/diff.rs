//! Field-level diff between a record's before and after images.

use ripple_core::{deep_equal, AttrMap};
use serde_json::Value as Json;
use smallvec::SmallVec;

/// Staged field changes for one record. `set` and `removed` are disjoint by
/// construction: a key is either present in the new image or it is not.
#[derive(Debug, Clone, Default)]
pub struct FieldDiff {
    /// Keys to set, with their new values converted to JSON.
    pub set: SmallVec<[(String, Json); 8]>,
    /// Keys present in the old image but absent from the new one.
    pub removed: SmallVec<[String; 4]>,
}

impl FieldDiff {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.removed.is_empty()
    }
}

/// Stage every new-image key whose value deep-differs from the old image,
/// and every old-image key the new image dropped. Keys iterate in the
/// images' sorted order, so downstream script text is deterministic.
pub fn diff_images(old: &AttrMap, new: &AttrMap) -> FieldDiff {
    let mut diff = FieldDiff::default();
    for (key, new_value) in new {
        let changed = match old.get(key) {
            Some(old_value) => !deep_equal(old_value, new_value),
            None => true,
        };
        if changed {
            diff.set.push((key.clone(), new_value.to_json()));
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            diff.removed.push(key.clone());
        }
    }
    diff
}
