// Render a single template file to stdout

use std::{fs, path::PathBuf};

use stencil_templates::TemplateEngine;

use super::{build_context, Command};
use crate::error::CliResult;

/// Render a template file against a context
pub struct RenderCommand {
    pub template: PathBuf,
    pub context: Option<PathBuf>,
    pub values: Vec<String>,
    pub custom_values: Vec<String>,
    /// Validate first and refuse to render on errors
    pub strict: bool,
}

impl Command for RenderCommand {
    fn execute(&self, engine: &TemplateEngine) -> CliResult<String> {
        let content = fs::read_to_string(&self.template)?;
        let context = build_context(self.context.as_deref(), &self.values, &self.custom_values)?;

        if self.strict {
            Ok(engine.render_checked(&content, &context)?)
        } else {
            Ok(engine.render(&content, &context))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use tempfile::TempDir;

    fn command(dir: &TempDir, template: &str, strict: bool) -> RenderCommand {
        let path = dir.path().join("t.tmpl");
        fs::write(&path, template).unwrap();
        RenderCommand {
            template: path,
            context: None,
            values: vec!["items=[\"a\",\"b\"]".to_string(), "name=demo".to_string()],
            custom_values: Vec::new(),
            strict,
        }
    }

    #[test]
    fn test_render_with_overrides() {
        let dir = TempDir::new().unwrap();
        let out = command(&dir, "{{name}}: {{#each items}}{{this}},{{/each}}", false)
            .execute(&TemplateEngine::new())
            .unwrap();
        assert_eq!(out, "demo: a,b");
    }

    #[test]
    fn test_strict_rejects_invalid_template() {
        let dir = TempDir::new().unwrap();
        let err = command(&dir, "{{#if name}}", true)
            .execute(&TemplateEngine::new())
            .unwrap_err();
        assert!(matches!(err, CliError::Template(_)));
    }

    #[test]
    fn test_lenient_renders_invalid_template() {
        let dir = TempDir::new().unwrap();
        let out = command(&dir, "{{#if name}}{{name}}", false)
            .execute(&TemplateEngine::new())
            .unwrap();
        assert_eq!(out, "{{#if name}}demo");
    }
}
