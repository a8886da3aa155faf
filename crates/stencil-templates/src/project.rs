//! Project template documents
//!
//! A project template describes a set of files whose paths and contents are
//! both templates. Rendering produces the file list in memory; writing it to
//! disk is left to the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{Result, TemplateError},
    models::TemplateContext,
    templates::engine::TemplateEngine,
};

/// A project template document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTemplate {
    /// Template name
    pub name: String,
    /// Template version
    #[serde(default)]
    pub version: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Project types this template applies to, e.g. `rust-cli`
    #[serde(default)]
    pub supported_project_types: Vec<String>,
    /// Variables the files reference
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,
    /// Files to generate
    #[serde(default)]
    pub files: Vec<TemplateFile>,
}

/// A variable declared by a project template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariable {
    /// Variable name, a top-level context key
    pub name: String,
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when the context has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Whether rendering fails without a value
    #[serde(default)]
    pub required: bool,
}

/// A file entry of a project template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFile {
    /// Output path template
    pub path: String,
    /// Content template
    pub template: String,
    /// Unix permission bits in octal, e.g. `"755"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    /// Variable path; the file is skipped when it resolves to a falsy value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// A rendered file, not yet written anywhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFile {
    /// Rendered output path
    pub path: String,
    /// Rendered content
    pub content: String,
    /// Permission bits as declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
}

impl RenderedFile {
    /// Permission bits parsed as octal
    pub fn mode(&self) -> Option<u32> {
        self.permissions
            .as_deref()
            .and_then(|p| u32::from_str_radix(p.trim().trim_start_matches("0o"), 8).ok())
    }
}

impl ProjectTemplate {
    /// Parse a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Whether the template declares support for `project_type`
    ///
    /// A template with no declared types supports every type.
    pub fn supports(&self, project_type: &str) -> bool {
        self.supported_project_types.is_empty()
            || self.supported_project_types.iter().any(|t| t == project_type)
    }

    /// Check the document structure, reporting every problem at once
    pub fn validate_structure(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push("Project template name cannot be empty".to_string());
        }
        if self.files.is_empty() {
            problems.push(format!("Project template '{}' has no files", self.name));
        }
        for (index, file) in self.files.iter().enumerate() {
            if file.path.trim().is_empty() {
                problems.push(format!("File #{} has an empty path", index + 1));
            }
            if let Some(permissions) = &file.permissions {
                if u32::from_str_radix(permissions.trim().trim_start_matches("0o"), 8).is_err() {
                    problems.push(format!(
                        "File '{}' has invalid permissions '{}'",
                        file.path, permissions
                    ));
                }
            }
        }
        for (index, variable) in self.variables.iter().enumerate() {
            if variable.name.trim().is_empty() {
                problems.push(format!("Variable #{} has an empty name", index + 1));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(TemplateError::ValidationFailed(problems))
        }
    }

    /// Context with declared defaults filled in
    ///
    /// # Errors
    /// `MissingPlaceholder` naming every required variable without a value
    pub fn resolve_context(&self, context: &TemplateContext) -> Result<TemplateContext> {
        let mut resolved = context.clone();
        let mut missing = Vec::new();

        for variable in &self.variables {
            if resolved.contains(&variable.name) {
                continue;
            }
            match &variable.default {
                Some(default) => resolved.insert(variable.name.clone(), default.clone()),
                None if variable.required => missing.push(variable.name.clone()),
                None => {}
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(TemplateError::MissingPlaceholder(missing.join(", ")))
        }
    }

    /// Render every file whose condition holds
    ///
    /// Every path and content template is validated before anything is
    /// rendered; all validation errors are reported together.
    pub fn render_files(
        &self,
        engine: &TemplateEngine,
        context: &TemplateContext,
    ) -> Result<Vec<RenderedFile>> {
        self.validate_structure()?;
        let context = self.resolve_context(context)?;

        let mut errors = Vec::new();
        for file in &self.files {
            for error in engine.validate(&file.path).errors() {
                errors.push(format!("{} (path): {}", file.path, error));
            }
            for error in engine.validate(&file.template).errors() {
                errors.push(format!("{}: {}", file.path, error));
            }
        }
        if !errors.is_empty() {
            return Err(TemplateError::ValidationFailed(errors));
        }

        let mut rendered = Vec::with_capacity(self.files.len());
        for file in &self.files {
            if let Some(condition) = &file.condition {
                if !engine.condition_holds(condition, &context) {
                    tracing::debug!(path = %file.path, condition = %condition, "Skipping file");
                    continue;
                }
            }

            let path = engine.render(&file.path, &context);
            if path.trim().is_empty() {
                return Err(TemplateError::RenderError(format!(
                    "Path template '{}' rendered to an empty path",
                    file.path
                )));
            }
            rendered.push(RenderedFile {
                path,
                content: engine.render(&file.template, &context),
                permissions: file.permissions.clone(),
            });
        }

        tracing::debug!(
            template = %self.name,
            files = rendered.len(),
            "Rendered project template"
        );
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = r##"
name: rust-cli
version: "1.0.0"
supportedProjectTypes: [rust-cli, rust-bin]
variables:
  - name: name
    required: true
  - name: license
    default: MIT
  - name: withTests
    default: false
files:
  - path: "{{name|kebabCase}}/Cargo.toml"
    template: |
      [package]
      name = "{{name|kebabCase}}"
      license = "{{license}}"
  - path: "{{name|kebabCase}}/tests/smoke.rs"
    template: "// tests for {{name}}"
    condition: withTests
  - path: "{{name|kebabCase}}/run.sh"
    template: "#!/bin/sh"
    permissions: "755"
"##;

    fn context() -> TemplateContext {
        TemplateContext::new().with_value("name", "My Tool")
    }

    #[test]
    fn test_parse_yaml_document() {
        let template = ProjectTemplate::from_yaml_str(DOC).unwrap();
        assert_eq!(template.name, "rust-cli");
        assert_eq!(template.version, "1.0.0");
        assert_eq!(template.variables.len(), 3);
        assert_eq!(template.files[1].condition.as_deref(), Some("withTests"));
        assert!(template.supports("rust-bin"));
        assert!(!template.supports("python"));
    }

    #[test]
    fn test_parse_json_document() {
        let template = ProjectTemplate::from_json_str(
            r#"{"name":"x","supportedProjectTypes":["a"],"files":[{"path":"p","template":"t"}]}"#,
        )
        .unwrap();
        assert_eq!(template.supported_project_types, vec!["a"]);
        assert_eq!(template.version, "");
    }

    #[test]
    fn test_render_files_applies_defaults_and_conditions() {
        let template = ProjectTemplate::from_yaml_str(DOC).unwrap();
        let engine = TemplateEngine::new();
        let files = template.render_files(&engine, &context()).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "my-tool/Cargo.toml");
        assert!(files[0].content.contains("name = \"my-tool\""));
        assert!(files[0].content.contains("license = \"MIT\""));
        assert_eq!(files[1].path, "my-tool/run.sh");
        assert_eq!(files[1].mode(), Some(0o755));
        assert_eq!(files[1].content, "#!/bin/sh");
    }

    #[test]
    fn test_condition_includes_file_when_truthy() {
        let template = ProjectTemplate::from_yaml_str(DOC).unwrap();
        let engine = TemplateEngine::new();
        let files = template
            .render_files(&engine, &context().with_value("withTests", true))
            .unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[1].content, "// tests for My Tool");
    }

    #[test]
    fn test_missing_required_variable() {
        let template = ProjectTemplate::from_yaml_str(DOC).unwrap();
        let engine = TemplateEngine::new();
        let err = template
            .render_files(&engine, &TemplateContext::new())
            .unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder(ref name) if name == "name"));
    }

    #[test]
    fn test_context_value_overrides_default() {
        let template = ProjectTemplate::from_yaml_str(DOC).unwrap();
        let resolved = template
            .resolve_context(&context().with_value("license", "Apache-2.0"))
            .unwrap();
        assert_eq!(resolved.values["license"], json!("Apache-2.0"));
        assert_eq!(resolved.values["withTests"], json!(false));
    }

    #[test]
    fn test_validation_errors_are_batched() {
        let template = ProjectTemplate {
            name: "broken".to_string(),
            version: "0.1.0".to_string(),
            description: None,
            supported_project_types: Vec::new(),
            variables: Vec::new(),
            files: vec![
                TemplateFile {
                    path: "a.txt".to_string(),
                    template: "{{#if x}}".to_string(),
                    permissions: None,
                    condition: None,
                },
                TemplateFile {
                    path: "{{helper:nope}}.txt".to_string(),
                    template: "ok".to_string(),
                    permissions: None,
                    condition: None,
                },
            ],
        };
        let err = template
            .render_files(&TemplateEngine::new(), &TemplateContext::new())
            .unwrap_err();
        match err {
            TemplateError::ValidationFailed(messages) => {
                assert!(messages.iter().any(|m| m.starts_with("a.txt:")));
                assert!(messages.iter().any(|m| m.contains("(path)")));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_structure() {
        let template = ProjectTemplate {
            name: String::new(),
            version: String::new(),
            description: None,
            supported_project_types: Vec::new(),
            variables: vec![TemplateVariable {
                name: " ".to_string(),
                description: None,
                default: None,
                required: false,
            }],
            files: Vec::new(),
        };
        match template.validate_structure() {
            Err(TemplateError::ValidationFailed(messages)) => assert_eq!(messages.len(), 3),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_rendered_path_is_error() {
        let template = ProjectTemplate::from_json_str(
            r#"{"name":"x","files":[{"path":"{{missing}}","template":"t"}]}"#,
        )
        .unwrap();
        let err = template
            .render_files(&TemplateEngine::new(), &TemplateContext::new())
            .unwrap_err();
        assert!(matches!(err, TemplateError::RenderError(_)));
    }

    #[test]
    fn test_invalid_permissions() {
        let template = ProjectTemplate::from_json_str(
            r#"{"name":"x","files":[{"path":"a","template":"t","permissions":"rwx"}]}"#,
        )
        .unwrap();
        assert!(template.validate_structure().is_err());
    }
}
