//! Template validation engine
//!
//! Checks a template without rendering it:
//! - block balance per family (errors)
//! - named helper calls against the registry (errors)
//! - tag well-formedness, unknown pipe helpers, block ordering (warnings)
//!
//! Every problem is collected; nothing stops at the first finding.

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    models::ValidationResult,
    templates::{
        helpers::HelperRegistry,
        matcher::{line_of, scan_tags, BlockFamily, BlockMatcher, BlockTag, Tag},
        parser::{classify_tag, parse_helper_args, HelperArg, InlineTag, TemplateParser},
    },
};

lazy_static! {
    static ref PATH_PATTERN: Regex =
        Regex::new(r"^(@?[A-Za-z_][A-Za-z0-9_-]*|[0-9]+)(\.(@?[A-Za-z_][A-Za-z0-9_-]*|[0-9]+))*$")
            .expect("valid path pattern");
    static ref HELPER_NAME_PATTERN: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid helper name pattern");
}

/// Whether `path` is a well-formed dotted path
pub fn is_valid_path(path: &str) -> bool {
    PATH_PATTERN.is_match(path)
}

/// Template validation engine
pub struct ValidationEngine;

impl ValidationEngine {
    /// Validate a template against the helpers currently registered
    ///
    /// # Returns
    /// `valid` is false iff a block family's start/end counts differ or a
    /// named helper call references an unregistered helper
    pub fn validate(content: &str, helpers: &HelperRegistry) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let scan = scan_tags(content);

        let mut counts_balanced = true;
        for family in BlockFamily::ALL {
            let blocks = BlockMatcher::scan_in(&scan.tags, family);
            if blocks.opens != blocks.closes {
                counts_balanced = false;
                errors.push(format!(
                    "Unbalanced {{{{#{kw}}}}} blocks: {} opening tag(s), {} closing tag(s)",
                    blocks.opens,
                    blocks.closes,
                    kw = family.keyword(),
                ));
                for &offset in &blocks.unclosed {
                    errors.push(format!(
                        "Line {}: {{{{#{}}}}} is never closed",
                        line_of(content, offset),
                        family.keyword()
                    ));
                }
                for &offset in &blocks.unmatched_closes {
                    errors.push(format!(
                        "Line {}: {{{{/{}}}}} has no matching start tag",
                        line_of(content, offset),
                        family.keyword()
                    ));
                }
            }
        }

        // Counts match, but the tags may still be out of order or interleaved.
        if counts_balanced {
            if let Err(err) = TemplateParser::parse(content) {
                warnings.push(err.to_string());
            }
        }

        for tag in &scan.tags {
            Self::check_tag(content, tag, helpers, &mut errors, &mut warnings);
        }

        if let Some(offset) = scan.unterminated {
            warnings.push(format!(
                "Line {}: '{{{{' is never terminated by '}}}}'",
                line_of(content, offset)
            ));
        }

        ValidationResult::from_findings(errors, warnings)
    }

    fn check_tag(
        content: &str,
        tag: &Tag<'_>,
        helpers: &HelperRegistry,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        let line = line_of(content, tag.start);

        match classify_tag(tag.inner) {
            InlineTag::Block(BlockTag::Open { family, argument }) => {
                if argument.is_empty() {
                    warnings.push(format!(
                        "Line {line}: {{{{#{}}}}} is missing its argument",
                        family.keyword()
                    ));
                } else if !is_valid_path(argument) {
                    warnings.push(format!(
                        "Line {line}: malformed {{{{#{}}}}} argument '{argument}'",
                        family.keyword()
                    ));
                }
            }
            InlineTag::Block(BlockTag::Close(_)) => {}
            InlineTag::UnknownBlock(inner) => {
                warnings.push(format!("Line {line}: unknown block tag '{{{{{inner}}}}}'"));
            }
            InlineTag::Variable(path) => {
                if path.is_empty() {
                    warnings.push(format!("Line {line}: empty tag '{{{{}}}}'"));
                } else if !is_valid_path(path) {
                    warnings.push(format!(
                        "Line {line}: malformed variable reference '{path}' (renders empty, does not affect validity)"
                    ));
                }
            }
            InlineTag::Pipe { path, helper } => {
                if !is_valid_path(path) {
                    warnings.push(format!(
                        "Line {line}: malformed variable reference '{path}' (renders empty, does not affect validity)"
                    ));
                }
                if !HELPER_NAME_PATTERN.is_match(helper) {
                    warnings.push(format!("Line {line}: malformed helper name '{helper}'"));
                } else if !helpers.contains(helper) {
                    warnings.push(format!(
                        "Line {line}: unknown pipe helper '{helper}' (value renders unconverted)"
                    ));
                }
            }
            InlineTag::HelperCall { name, args } => {
                if !helpers.contains(name) {
                    errors.push(format!("Line {line}: unknown helper '{name}'"));
                }
                for arg in parse_helper_args(args) {
                    if let HelperArg::Path(path) = arg {
                        if !is_valid_path(&path) {
                            warnings.push(format!(
                                "Line {line}: malformed argument '{path}' in call to '{name}'"
                            ));
                        }
                    }
                }
            }
        }
    }
}
