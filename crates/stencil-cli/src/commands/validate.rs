// Validate template files without rendering them

use std::{fs, path::PathBuf};

use stencil_templates::TemplateEngine;
use tracing::debug;

use super::Command;
use crate::error::{CliError, CliResult};

/// Validate one or more template files, reporting every problem together
pub struct ValidateCommand {
    pub templates: Vec<PathBuf>,
}

impl ValidateCommand {
    pub fn new(templates: Vec<PathBuf>) -> Self {
        Self { templates }
    }
}

impl Command for ValidateCommand {
    fn execute(&self, engine: &TemplateEngine) -> CliResult<String> {
        if self.templates.is_empty() {
            return Err(CliError::InvalidArgument {
                message: "no template files given".to_string(),
            });
        }

        let mut errors = Vec::new();
        let mut out = String::new();

        for path in &self.templates {
            let content = fs::read_to_string(path)?;
            let result = engine.validate(&content);
            debug!(path = %path.display(), valid = result.is_valid(), "Validated template");

            for warning in result.warnings() {
                out.push_str(&format!("warning: {}: {}\n", path.display(), warning));
            }
            if result.is_valid() {
                out.push_str(&format!("ok: {}\n", path.display()));
            }
            errors.extend(
                result
                    .errors()
                    .iter()
                    .map(|e| format!("{}: {}", path.display(), e)),
            );
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(CliError::ValidationFailed(errors))
        }
    }
}
