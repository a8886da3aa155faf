//! Template loading from files and directories
//!
//! Loads `.tmpl` files from global and project-specific locations, project
//! template documents, and context documents. This is the only part of the
//! crate that performs I/O; it happens before rendering.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::{
    error::{Result, TemplateError},
    models::TemplateContext,
    project::ProjectTemplate,
    templates::parser::TemplateParser,
};

/// Extension of standalone template files
pub const TEMPLATE_EXTENSION: &str = "tmpl";

/// A template read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTemplate {
    /// File name without `.tmpl` and the language extension
    pub id: String,
    /// Language extension before `.tmpl`, e.g. `rs` for `model.rs.tmpl`
    pub language: String,
    /// Source file
    pub path: PathBuf,
    /// Raw template text
    pub content: String,
    /// Root context names the template references
    pub placeholders: Vec<String>,
}

/// Document formats understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl DocumentFormat {
    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            Some("json") => Ok(DocumentFormat::Json),
            _ => Err(TemplateError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Loads templates and documents from the filesystem
#[derive(Debug, Clone, Default)]
pub struct TemplateLoader;

impl TemplateLoader {
    /// Create a new template loader
    pub fn new() -> Self {
        Self
    }

    /// Load a single template file
    pub fn load_from_file(&self, path: &Path) -> Result<LoadedTemplate> {
        let content = fs::read_to_string(path)?;
        let placeholders = TemplateParser::parse_lenient(&content)
            .placeholder_names
            .into_iter()
            .collect();
        let (id, language) = split_template_name(path);

        Ok(LoadedTemplate {
            id,
            language,
            path: path.to_path_buf(),
            content,
            placeholders,
        })
    }

    /// Load every `.tmpl` file under `dir`, recursively, sorted by path
    ///
    /// A missing directory yields an empty list. Files that cannot be read
    /// are skipped with a warning.
    pub fn load_from_directory(&self, dir: &Path) -> Result<Vec<LoadedTemplate>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        collect_template_paths(dir, &mut paths)?;
        paths.sort();

        let mut templates = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_from_file(&path) {
                Ok(template) => templates.push(template),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Failed to load template");
                }
            }
        }
        Ok(templates)
    }

    /// Global template directory, `<config dir>/stencil/templates`
    pub fn global_templates_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stencil")
            .join("templates")
    }

    /// Project template directory, `<root>/.stencil/templates`
    pub fn project_templates_dir(project_root: &Path) -> PathBuf {
        project_root.join(".stencil").join("templates")
    }

    /// Templates from `global_dir` overridden by the project's own, keyed by id
    pub fn load_layered(
        &self,
        global_dir: &Path,
        project_root: &Path,
    ) -> Result<BTreeMap<String, LoadedTemplate>> {
        let mut templates = BTreeMap::new();
        for template in self.load_from_directory(global_dir)? {
            templates.insert(template.id.clone(), template);
        }
        for template in self.load_from_directory(&Self::project_templates_dir(project_root))? {
            templates.insert(template.id.clone(), template);
        }
        Ok(templates)
    }

    /// Load a project template document (`.yaml`, `.yml` or `.json`)
    pub fn load_project(&self, path: &Path) -> Result<ProjectTemplate> {
        let content = fs::read_to_string(path)?;
        let project = match DocumentFormat::from_path(path)? {
            DocumentFormat::Yaml => ProjectTemplate::from_yaml_str(&content)?,
            DocumentFormat::Json => ProjectTemplate::from_json_str(&content)?,
        };
        tracing::debug!(path = %path.display(), name = %project.name, "Loaded project template");
        Ok(project)
    }

    /// Load a render context from a `.yaml`, `.yml` or `.json` document
    pub fn load_context(&self, path: &Path) -> Result<TemplateContext> {
        let content = fs::read_to_string(path)?;
        let value: Value = match DocumentFormat::from_path(path)? {
            DocumentFormat::Yaml => serde_yaml::from_str(&content)?,
            DocumentFormat::Json => serde_json::from_str(&content)?,
        };
        TemplateContext::from_value(value)
    }
}

fn collect_template_paths(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_template_paths(&path, paths)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(TEMPLATE_EXTENSION) {
            paths.push(path);
        }
    }
    Ok(())
}

/// Split `model.rs.tmpl` into (`model`, `rs`)
fn split_template_name(path: &Path) -> (String, String) {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
    let stem = file_name
        .strip_suffix(".tmpl")
        .unwrap_or(file_name);
    match stem.rsplit_once('.') {
        Some((id, language)) if !id.is_empty() => (id.to_string(), language.to_string()),
        _ => (stem.to_string(), "unknown".to_string()),
    }
}
