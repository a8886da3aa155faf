//! Template engine module
//!
//! Provides template parsing, block matching, evaluation, validation,
//! compilation caching and loading.

pub mod cache;
pub mod conditional;
pub mod engine;
pub mod helpers;
pub mod loader;
pub mod loops;
pub mod matcher;
pub mod parser;
pub mod resolver;
pub mod validation;

// Re-export public API
pub use cache::{BlockTreeCompiler, CacheStats, CachedCompilation, CompilationCache, TemplateCompiler};
pub use conditional::is_truthy;
pub use engine::TemplateEngine;
pub use helpers::{BuiltinHelper, HelperFn, HelperHandle, HelperRegistry};
pub use loader::{DocumentFormat, LoadedTemplate, TemplateLoader};
pub use matcher::{BlockFamily, BlockMatcher, BlockScan, BlockSpan};
pub use parser::{HelperArg, ParsedTemplate, TemplateElement, TemplateParser, MAX_NESTING_DEPTH};
pub use resolver::{Scope, ValueResolver};
pub use validation::ValidationEngine;
