#![warn(missing_docs)]

//! Template rendering engine for stencil
//!
//! Renders templates containing variables, helper invocations and nested
//! `{{#if}}`/`{{#each}}` blocks against a JSON-shaped context, with static
//! validation, a content-addressed compilation cache and project template
//! documents that render whole file sets.

pub mod config;
pub mod error;
pub mod models;
pub mod project;
pub mod templates;

// Re-export public API
pub use config::{CacheConfig, EngineConfig};
pub use error::{HelperError, Result, TemplateError};
pub use models::{TemplateContext, ValidationResult};
pub use project::{ProjectTemplate, RenderedFile, TemplateFile, TemplateVariable};
pub use templates::{
    is_truthy, BlockFamily, BlockMatcher, BlockSpan, BlockTreeCompiler, BuiltinHelper,
    CacheStats, CompilationCache, HelperFn, HelperRegistry, LoadedTemplate, ParsedTemplate,
    Scope, TemplateCompiler, TemplateElement, TemplateEngine, TemplateLoader, TemplateParser,
    ValidationEngine, ValueResolver,
};
