// Command handlers for the stencil CLI

pub mod helpers;
pub mod project;
pub mod render;
pub mod validate;

pub use helpers::HelpersCommand;
pub use project::ProjectCommand;
pub use render::RenderCommand;
pub use validate::ValidateCommand;

use std::path::Path;

use serde_json::Value;
use stencil_templates::{TemplateContext, TemplateEngine, TemplateLoader};

use crate::error::{CliError, CliResult};

/// Trait for command handlers
///
/// Commands return their output instead of printing it so the caller decides
/// where it goes.
pub trait Command {
    /// Execute the command
    fn execute(&self, engine: &TemplateEngine) -> CliResult<String>;
}

/// Build a render context from an optional document plus `key=value` overrides
///
/// Override values are parsed as JSON when possible (`count=3`, `flag=true`,
/// `tags=["a","b"]`) and kept as plain strings otherwise.
pub fn build_context(
    document: Option<&Path>,
    values: &[String],
    custom_values: &[String],
) -> CliResult<TemplateContext> {
    let mut context = match document {
        Some(path) => TemplateLoader::new().load_context(path)?,
        None => TemplateContext::new(),
    };

    for assignment in values {
        let (key, value) = parse_assignment(assignment)?;
        context.insert(key, value);
    }
    for assignment in custom_values {
        let (key, value) = parse_assignment(assignment)?;
        context.insert_custom(key, value);
    }

    Ok(context)
}

fn parse_assignment(assignment: &str) -> CliResult<(String, Value)> {
    let (key, raw) = assignment
        .split_once('=')
        .ok_or_else(|| CliError::InvalidArgument {
            message: format!("expected KEY=VALUE, got '{}'", assignment),
        })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidArgument {
            message: format!("empty key in '{}'", assignment),
        });
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_assignment_values() {
        assert_eq!(parse_assignment("n=3").unwrap(), ("n".to_string(), json!(3)));
        assert_eq!(parse_assignment("on=true").unwrap().1, json!(true));
        assert_eq!(parse_assignment("name=My Tool").unwrap().1, json!("My Tool"));
        assert_eq!(parse_assignment("xs=[\"a\"]").unwrap().1, json!(["a"]));
        assert_eq!(parse_assignment("empty=").unwrap().1, json!(""));
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_build_context_overrides_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ctx.json");
        fs::write(&path, r#"{"name": "file", "keep": 1}"#).unwrap();

        let context = build_context(
            Some(&path),
            &["name=flag".to_string()],
            &["team=core".to_string()],
        )
        .unwrap();
        assert_eq!(context.values["name"], json!("flag"));
        assert_eq!(context.values["keep"], json!(1));
        assert_eq!(context.custom_values["team"], json!("core"));
    }
}
