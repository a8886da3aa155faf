//! `{{#if}}` evaluation

use serde_json::Value;

use crate::templates::{
    parser::TemplateElement,
    resolver::{Scope, ValueResolver},
};

/// Truthiness of a resolved value
///
/// Absent, `null`, `false`, `0`, `""` and empty collections are falsy;
/// everything else is truthy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Render `content` when `condition` resolves to a truthy value
pub(crate) fn render_conditional<F>(
    resolver: &ValueResolver,
    condition: &str,
    content: &[TemplateElement],
    scope: &Scope<'_>,
    render_body: F,
) -> String
where
    F: FnOnce(&[TemplateElement], &Scope<'_>) -> String,
{
    if is_truthy(resolver.resolve(condition, scope)) {
        render_body(content, scope)
    } else {
        String::new()
    }
}
