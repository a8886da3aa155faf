//! Dotted-path resolution against a context and its derived scopes

use serde_json::{Map, Value};

use crate::models::TemplateContext;

/// Default prefix of the custom-variable namespace
pub const DEFAULT_CUSTOM_NAMESPACE: &str = "custom";

/// A read-only view over a [`TemplateContext`] plus any per-iteration bindings
///
/// Loop evaluation never mutates the caller's context: each iteration builds a
/// child scope holding its own bindings, and lookups walk from the innermost
/// frame outwards before reaching the root context.
#[derive(Debug)]
pub struct Scope<'a> {
    context: &'a TemplateContext,
    bindings: Map<String, Value>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    /// Root scope over a caller-supplied context
    pub fn root(context: &'a TemplateContext) -> Self {
        Self {
            context,
            bindings: Map::new(),
            parent: None,
        }
    }

    /// Derive a child scope with extra bindings shadowing everything above it
    pub fn child(&'a self, bindings: Map<String, Value>) -> Scope<'a> {
        Scope {
            context: self.context,
            bindings,
            parent: Some(self),
        }
    }

    /// The caller's context
    pub fn context(&self) -> &'a TemplateContext {
        self.context
    }

    /// Look up a single top-level name
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.bindings.get(name) {
            return Some(value);
        }
        match self.parent {
            Some(parent) => parent.lookup(name),
            None => self.context.values.get(name),
        }
    }
}

/// Resolves dotted paths such as `project.author.name`
///
/// Misses are a normal outcome: any absent or non-traversable segment yields
/// `None`, which renders as empty text.
#[derive(Debug, Clone)]
pub struct ValueResolver {
    custom_namespace: String,
}

impl ValueResolver {
    /// Create a resolver using the default custom namespace
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_CUSTOM_NAMESPACE)
    }

    /// Create a resolver with a specific custom namespace prefix
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            custom_namespace: namespace.into(),
        }
    }

    /// Prefix that routes a path to the custom-variable map
    pub fn custom_namespace(&self) -> &str {
        &self.custom_namespace
    }

    /// Resolve `path` in `scope`
    pub fn resolve<'s>(&self, path: &str, scope: &'s Scope<'_>) -> Option<&'s Value> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }

        let mut segments = path.split('.');
        let head = segments.next()?;

        if !self.custom_namespace.is_empty() && head == self.custom_namespace {
            let key = segments.next()?;
            let start = scope.context().custom_values.get(key)?;
            return walk(start, segments);
        }

        walk(scope.lookup(head)?, segments)
    }

    /// Resolve `path` and convert it to its text form; absent becomes ""
    pub fn resolve_text(&self, path: &str, scope: &Scope<'_>) -> String {
        self.resolve(path, scope).map(stringify).unwrap_or_default()
    }
}

impl Default for ValueResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn walk<'v, 'p>(start: &'v Value, segments: impl Iterator<Item = &'p str>) -> Option<&'v Value> {
    let mut current = start;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Text form of a value
///
/// Strings are verbatim, null is empty, arrays join their items' text forms
/// with commas and objects render as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
