//! Fixed update-script templates.
//!
//! Four small string builders, not a code-generation layer: set a field,
//! remove a field, append to an array field, remove matching array items.
//! Field names come from trusted processor configuration and image keys,
//! never from user input.

/// `ctx._source['k'] = params['k'];`
pub fn set_field_stmt(key: &str) -> String {
    format!("ctx._source['{key}'] = params['{key}'];")
}

/// `ctx._source.remove('k');`
pub fn remove_field_stmt(key: &str) -> String {
    format!("ctx._source.remove('{key}');")
}

/// Compose the ordinary-entity update script: all set statements first, then
/// all removals, joined by single spaces.
pub fn field_update_script<'a, S, R>(set_keys: S, removed_keys: R) -> String
where
    S: IntoIterator<Item = &'a str>,
    R: IntoIterator<Item = &'a str>,
{
    let stmts: Vec<String> = set_keys
        .into_iter()
        .map(set_field_stmt)
        .chain(removed_keys.into_iter().map(remove_field_stmt))
        .collect();
    stmts.join(" ")
}

/// Append `params.item` to an array field, initializing the field when the
/// document has never carried it.
pub fn array_append_script(field: &str) -> String {
    format!(
        "if (ctx._source.{field} == null) {{ ctx._source.{field} = []; }} \
         ctx._source.{field}.add(params.item);"
    )
}

/// Remove every array item whose unique attribute equals `params.uniqueId`.
pub fn array_remove_script(field: &str, unique_attr: &str) -> String {
    format!(
        "if (ctx._source.{field} != null) {{ \
         ctx._source.{field}.removeIf(item -> item.{unique_attr} == params.uniqueId); }}"
    )
}
