//! Template engine for rendering templates against a context
//!
//! Provides template rendering with support for:
//! - Variable substitution (`{{project.name}}`)
//! - Pipe helpers (`{{name|snakeCase}}`) and named helper calls (`{{helper:join items}}`)
//! - Conditional blocks (`{{#if}}...{{/if}}`)
//! - Loops over arrays and maps (`{{#each}}...{{/each}}`)
//!
//! The template is compiled once through the compilation cache and evaluated
//! as a tree. If the output still holds tags (for example from context values
//! that themselves contain template syntax) it is re-rendered until it stops
//! changing, within `max_passes`, followed by a few variable-only passes.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    config::EngineConfig,
    error::{Result, TemplateError},
    models::{TemplateContext, ValidationResult},
    templates::{
        cache::{BlockTreeCompiler, CacheStats, CompilationCache},
        conditional::{is_truthy, render_conditional},
        helpers::{HelperFn, HelperRegistry},
        loops::render_loop,
        matcher::scan_tags,
        parser::{classify_tag, HelperArg, InlineTag, ParsedTemplate, TemplateElement, TemplateParser},
        resolver::{stringify, Scope, ValueResolver},
        validation::ValidationEngine,
    },
};

const TAG_OPEN: &str = "{{";

/// Template engine
///
/// Owns its helper registry and compilation cache; both are safe to use from
/// several threads through a shared reference.
pub struct TemplateEngine {
    config: EngineConfig,
    resolver: ValueResolver,
    helpers: HelperRegistry,
    cache: CompilationCache<BlockTreeCompiler>,
}

impl TemplateEngine {
    /// Create a template engine with default settings
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a template engine with specific settings
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            resolver: ValueResolver::with_namespace(config.custom_namespace.clone()),
            helpers: HelperRegistry::new(),
            cache: CompilationCache::with_compiler(BlockTreeCompiler, config.cache.clone()),
            config,
        }
    }

    /// Engine settings
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Helper registry
    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    /// Register a helper; an existing helper with the same name is replaced
    pub fn register_helper(&self, name: impl Into<String>, helper: HelperFn) {
        self.helpers.register(name, helper);
    }

    /// Compile a template, reusing the cached form for identical text
    pub fn compile(&self, template: &str) -> Result<Arc<ParsedTemplate>> {
        self.cache.compile(template)
    }

    /// Drop every cached compilation
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Remove expired cache entries now
    pub fn sweep_cache(&self) -> usize {
        self.cache.sweep_expired()
    }

    /// Check a template without rendering it
    pub fn validate(&self, template: &str) -> ValidationResult {
        ValidationEngine::validate(template, &self.helpers)
    }

    /// Render a template
    ///
    /// Never fails: missing values render as empty text, failing helpers are
    /// recovered locally, and a template with unbalanced blocks is rendered
    /// best-effort with the unpaired tags left as text. Each pass builds at
    /// most [`MAX_NESTING_DEPTH`](crate::templates::parser::MAX_NESTING_DEPTH)
    /// block levels; deeper blocks are reached by the following passes.
    ///
    /// # Arguments
    /// * `template` - The template content to render
    /// * `context` - Values referenced by the template
    pub fn render(&self, template: &str, context: &TemplateContext) -> String {
        let scope = Scope::root(context);

        let mut output = match self.compile(template) {
            Ok(parsed) => self.render_elements(&parsed.elements, &scope),
            Err(err) => {
                tracing::warn!(error = %err, "Template failed to compile, rendering best-effort");
                self.render_elements(&TemplateParser::parse_lenient(template).elements, &scope)
            }
        };

        let mut passes = 1;
        while passes < self.config.max_passes && output.contains(TAG_OPEN) {
            let next = self.render_elements(&TemplateParser::parse_lenient(&output).elements, &scope);
            passes += 1;
            tracing::trace!(pass = passes, len = next.len(), "Render pass");
            if next == output {
                break;
            }
            output = next;
        }

        for cleanup in 0..self.config.cleanup_passes {
            if !output.contains(TAG_OPEN) {
                break;
            }
            let next = self.substitute_variables(&output, &scope);
            tracing::trace!(cleanup, "Variable cleanup pass");
            if next == output {
                break;
            }
            output = next;
        }

        output
    }

    /// Validate first, then render; fails with every validation error batched
    pub fn render_checked(&self, template: &str, context: &TemplateContext) -> Result<String> {
        self.validate(template).into_result()?;
        Ok(self.render(template, context))
    }

    /// Whether `path` resolves to a truthy value in `context`
    pub fn condition_holds(&self, path: &str, context: &TemplateContext) -> bool {
        is_truthy(self.resolver.resolve(path, &Scope::root(context)))
    }

    /// Render with a context given as a JSON object
    pub fn render_value(&self, template: &str, context: Value) -> Result<String> {
        Ok(self.render(template, &TemplateContext::from_value(context)?))
    }

    fn render_elements(&self, elements: &[TemplateElement], scope: &Scope<'_>) -> String {
        let mut result = String::new();

        for element in elements {
            match element {
                TemplateElement::Text(text) => result.push_str(text),
                TemplateElement::Variable(path) => {
                    result.push_str(&self.resolver.resolve_text(path, scope));
                }
                TemplateElement::Pipe { path, helper } => {
                    result.push_str(&self.render_pipe(path, helper, scope));
                }
                TemplateElement::HelperCall { name, args } => {
                    result.push_str(&self.render_helper_call(name, args, scope));
                }
                TemplateElement::Conditional { condition, content } => {
                    result.push_str(&render_conditional(
                        &self.resolver,
                        condition,
                        content,
                        scope,
                        |body, scope| self.render_elements(body, scope),
                    ));
                }
                TemplateElement::Loop { variable, content } => {
                    result.push_str(&render_loop(
                        &self.resolver,
                        variable,
                        content,
                        scope,
                        |body, scope| self.render_elements(body, scope),
                    ));
                }
            }
        }

        result
    }

    /// `{{path|helper}}`: the helper's result, or the raw value if the helper fails
    fn render_pipe(&self, path: &str, helper: &str, scope: &Scope<'_>) -> String {
        let Some(value) = self.resolver.resolve(path, scope) else {
            return String::new();
        };
        match self.helpers.call(helper, std::slice::from_ref(value)) {
            Ok(converted) => stringify(&converted),
            Err(err) => {
                tracing::debug!(helper, error = %err, "Pipe helper failed, using raw value");
                stringify(value)
            }
        }
    }

    /// `{{helper:name args}}`: the helper's result, or empty text if it fails
    fn render_helper_call(&self, name: &str, args: &[HelperArg], scope: &Scope<'_>) -> String {
        let values: Vec<Value> = args
            .iter()
            .map(|arg| match arg {
                HelperArg::Literal(value) => value.clone(),
                HelperArg::Path(path) => self
                    .resolver
                    .resolve(path, scope)
                    .cloned()
                    .unwrap_or(Value::Null),
            })
            .collect();

        match self.helpers.call(name, &values) {
            Ok(value) => stringify(&value),
            Err(err) => {
                tracing::debug!(helper = name, error = %err, "Helper call failed, rendering empty");
                String::new()
            }
        }
    }

    /// Replace plain `{{path}}` tags only; every other tag is left untouched
    fn substitute_variables(&self, text: &str, scope: &Scope<'_>) -> String {
        let mut result = String::with_capacity(text.len());
        let mut cursor = 0;
        for tag in scan_tags(text).tags {
            if let InlineTag::Variable(path) = classify_tag(tag.inner) {
                result.push_str(&text[cursor..tag.start]);
                result.push_str(&self.resolver.resolve_text(path, scope));
                cursor = tag.end;
            }
        }
        result.push_str(&text[cursor..]);
        result
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<EngineConfig> for TemplateEngine {
    type Error = TemplateError;

    fn try_from(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }
}
