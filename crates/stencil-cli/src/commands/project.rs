// Dry-run rendering of a project template document

use std::{fmt::Write, path::PathBuf};

use stencil_templates::{TemplateEngine, TemplateLoader};
use tracing::info;

use super::{build_context, Command};
use crate::error::{CliError, CliResult};

/// Render every file of a project template and report the result
///
/// Nothing is written to disk.
pub struct ProjectCommand {
    pub document: PathBuf,
    pub context: Option<PathBuf>,
    pub values: Vec<String>,
    pub custom_values: Vec<String>,
    pub project_type: Option<String>,
    pub show_content: bool,
}

impl Command for ProjectCommand {
    fn execute(&self, engine: &TemplateEngine) -> CliResult<String> {
        let project = TemplateLoader::new().load_project(&self.document)?;

        if let Some(project_type) = &self.project_type {
            if !project.supports(project_type) {
                return Err(CliError::InvalidArgument {
                    message: format!(
                        "template '{}' does not support project type '{}' (supported: {})",
                        project.name,
                        project_type,
                        project.supported_project_types.join(", ")
                    ),
                });
            }
        }

        let context = build_context(self.context.as_deref(), &self.values, &self.custom_values)?;
        let files = project.render_files(engine, &context)?;
        info!(template = %project.name, files = files.len(), "Project dry run complete");

        let mut out = String::new();
        let _ = writeln!(out, "{} {} ({} file(s))", project.name, project.version, files.len());
        for file in &files {
            match file.mode() {
                Some(mode) => {
                    let _ = writeln!(out, "  {} [{:o}]", file.path, mode);
                }
                None => {
                    let _ = writeln!(out, "  {}", file.path);
                }
            }
        }
        if self.show_content {
            for file in &files {
                let _ = write!(out, "\n==> {} <==\n{}", file.path, file.content);
                if !file.content.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }
}
