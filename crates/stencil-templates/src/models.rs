//! Core data models for template rendering

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TemplateError};

/// Values a template is rendered against
///
/// The general values form a tree of JSON values. Custom variables live in a
/// separate map addressed through the engine's custom namespace prefix
/// (`custom.name` by default), so they never collide with general values of
/// the same short name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateContext {
    /// General variable tree
    #[serde(default)]
    pub values: Map<String, Value>,
    /// Custom variables, resolved only through the custom namespace
    #[serde(default)]
    pub custom_values: Map<String, Value>,
}

impl TemplateContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object
    ///
    /// Fails if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(values) => Ok(Self {
                values,
                custom_values: Map::new(),
            }),
            Value::Null => Ok(Self::default()),
            other => Err(TemplateError::RenderError(format!(
                "Context must be an object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Insert a general value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Insert a custom-namespace value
    pub fn insert_custom(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.custom_values.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`TemplateContext::insert`]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder-style variant of [`TemplateContext::insert_custom`]
    pub fn with_custom(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_custom(name, value);
        self
    }

    /// Check whether a top-level general value is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Outcome of static template validation
///
/// Either `valid` is true and `errors` is empty, or `valid` is false and
/// `errors` holds at least one message. Warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    /// Build a result from accumulated findings
    ///
    /// Duplicate messages are collapsed, keeping first-seen order.
    pub fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        let errors = dedup(errors);
        let warnings = dedup(warnings);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Whether the template passed every error-level check
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Error messages, one per distinct problem
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Non-fatal findings
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Convert into a `Result`, batching every error message
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.valid {
            Ok(self.warnings)
        } else {
            Err(TemplateError::ValidationFailed(self.errors))
        }
    }
}

fn dedup(messages: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    messages
        .into_iter()
        .filter(|m| seen.insert(m.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_from_object() {
        let ctx = TemplateContext::from_value(json!({"name": "demo"})).unwrap();
        assert!(ctx.contains("name"));
        assert!(ctx.custom_values.is_empty());
    }

    #[test]
    fn test_context_from_null_is_empty() {
        let ctx = TemplateContext::from_value(Value::Null).unwrap();
        assert!(ctx.values.is_empty());
    }

    #[test]
    fn test_context_from_array_fails() {
        let result = TemplateContext::from_value(json!([1, 2]));
        assert!(matches!(result, Err(TemplateError::RenderError(_))));
    }

    #[test]
    fn test_context_builders() {
        let ctx = TemplateContext::new()
            .with_value("name", "demo")
            .with_custom("name", "other");
        assert_eq!(ctx.values["name"], json!("demo"));
        assert_eq!(ctx.custom_values["name"], json!("other"));
    }

    #[test]
    fn test_context_deserializes_without_custom_values() {
        let ctx: TemplateContext = serde_json::from_value(json!({"values": {"a": 1}})).unwrap();
        assert_eq!(ctx.values["a"], json!(1));
        assert!(ctx.custom_values.is_empty());
    }

    #[test]
    fn test_validation_result_valid_when_no_errors() {
        let result = ValidationResult::from_findings(vec![], vec!["w".to_string()]);
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
        assert_eq!(result.warnings(), ["w".to_string()]);
    }

    #[test]
    fn test_validation_result_dedups_errors() {
        let result = ValidationResult::from_findings(
            vec!["Unknown helper: x".to_string(), "Unknown helper: x".to_string()],
            vec![],
        );
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_validation_result_into_result() {
        let result = ValidationResult::from_findings(vec!["bad".to_string()], vec![]);
        match result.into_result() {
            Err(TemplateError::ValidationFailed(errors)) => assert_eq!(errors, vec!["bad"]),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
