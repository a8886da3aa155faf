//! `{{#each}}` evaluation
//!
//! Every iteration renders its body in a child scope holding:
//! - `this`: the current item
//! - the collection's last path segment bound to the item (arrays only)
//! - the item's own fields when it is an object, shadowing outer names
//! - `@index`, `@first`, `@last`, and `@key` for maps

use serde_json::{Map, Value};

use crate::templates::{
    parser::TemplateElement,
    resolver::{Scope, ValueResolver},
};

/// Binding for the current item
pub const THIS: &str = "this";
/// Zero-based position, as text
pub const INDEX: &str = "@index";
/// Whether this is the first iteration
pub const FIRST: &str = "@first";
/// Whether this is the last iteration
pub const LAST: &str = "@last";
/// Entry key when iterating a map
pub const KEY: &str = "@key";

/// Per-iteration bindings for iterating `collection`, which was resolved from `name`
///
/// Arrays iterate in order, maps in insertion order. Any other value yields
/// no iterations.
pub fn iteration_frames(name: &str, collection: &Value) -> Vec<Map<String, Value>> {
    match collection {
        Value::Array(items) => {
            let alias = alias_for(name);
            let count = items.len();
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let mut frame = Map::new();
                    if let Some(alias) = alias {
                        frame.insert(alias.to_string(), item.clone());
                    }
                    bind_item(&mut frame, item, index, count);
                    frame
                })
                .collect()
        }
        Value::Object(entries) => {
            let count = entries.len();
            entries
                .iter()
                .enumerate()
                .map(|(index, (key, item))| {
                    let mut frame = Map::new();
                    bind_item(&mut frame, item, index, count);
                    frame.insert(KEY.to_string(), Value::String(key.clone()));
                    frame
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

fn alias_for(name: &str) -> Option<&str> {
    let last = name.trim().rsplit('.').next()?;
    if last.is_empty() || last == THIS || last.starts_with('@') {
        None
    } else {
        Some(last)
    }
}

fn bind_item(frame: &mut Map<String, Value>, item: &Value, index: usize, count: usize) {
    if let Value::Object(fields) = item {
        for (field, value) in fields {
            frame.insert(field.clone(), value.clone());
        }
    }
    frame.insert(THIS.to_string(), item.clone());
    frame.insert(INDEX.to_string(), Value::String(index.to_string()));
    frame.insert(FIRST.to_string(), Value::Bool(index == 0));
    frame.insert(LAST.to_string(), Value::Bool(index + 1 == count));
}

/// Drop one trailing comma from a rendered iteration
///
/// Trailing whitespace after the comma is kept, so `"b",\n` becomes `"b"\n`.
/// This keeps comma-separated items in generated JSON-like files valid.
pub fn strip_trailing_separator(output: &mut String) {
    let end = output.trim_end().len();
    if output[..end].ends_with(',') {
        output.remove(end - 1);
    }
}

/// Render `content` once per item of the collection at `variable`
pub(crate) fn render_loop<F>(
    resolver: &ValueResolver,
    variable: &str,
    content: &[TemplateElement],
    scope: &Scope<'_>,
    mut render_body: F,
) -> String
where
    F: FnMut(&[TemplateElement], &Scope<'_>) -> String,
{
    let Some(collection) = resolver.resolve(variable, scope) else {
        return String::new();
    };

    let mut outputs: Vec<String> = iteration_frames(variable, collection)
        .into_iter()
        .map(|frame| {
            let child = scope.child(frame);
            render_body(content, &child)
        })
        .collect();

    if let Some(last) = outputs.last_mut() {
        strip_trailing_separator(last);
    }
    outputs.concat()
}
