//! Template syntax parser
//!
//! Builds an element tree from template text. Block structure comes from the
//! block matcher, one nesting level at a time; the text between blocks is
//! split into plain text, variables, pipe helpers and named helper calls.
//!
//! Blocks nest at most [`MAX_NESTING_DEPTH`] levels. Strict parsing rejects
//! deeper templates; lenient parsing keeps the tags below that level as text.

use std::{collections::BTreeSet, ops::Range};

use serde_json::Value;

use crate::{
    error::{Result, TemplateError},
    templates::matcher::{
        classify_block_tag, line_of, scan_tags, BlockFamily, BlockMatcher, BlockSpan, BlockTag,
        Tag,
    },
};

/// Deepest block nesting the parser builds into the element tree
pub const MAX_NESTING_DEPTH: usize = 256;

/// Prefix of the named helper call form, `{{helper:name arg ...}}`
pub const HELPER_CALL_PREFIX: &str = "helper:";

/// Argument of a named helper call
#[derive(Debug, Clone, PartialEq)]
pub enum HelperArg {
    /// Path resolved against the current scope
    Path(String),
    /// Quoted string, number, boolean or null written inline
    Literal(Value),
}

/// A parsed template element
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateElement {
    /// Plain text content
    Text(String),
    /// Variable: `{{path}}`
    Variable(String),
    /// Pipe helper: `{{path|helper}}`
    Pipe {
        /// Path of the value passed to the helper
        path: String,
        /// Helper name
        helper: String,
    },
    /// Named helper call: `{{helper:name arg1 arg2}}`
    HelperCall {
        /// Helper name
        name: String,
        /// Positional arguments
        args: Vec<HelperArg>,
    },
    /// Conditional block: `{{#if condition}}...{{/if}}`
    Conditional {
        /// Condition path
        condition: String,
        /// Content inside the conditional
        content: Vec<TemplateElement>,
    },
    /// Loop block: `{{#each items}}...{{/each}}`
    Loop {
        /// Collection path
        variable: String,
        /// Content inside the loop
        content: Vec<TemplateElement>,
    },
}

/// Classification of a single tag's inner text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineTag<'s> {
    /// `#if`, `#each`, `/if`, `/each`
    Block(BlockTag<'s>),
    /// `#something` or `/something` with an unknown keyword
    UnknownBlock(&'s str),
    /// `helper:name args`
    HelperCall {
        /// Helper name
        name: &'s str,
        /// Unparsed argument text
        args: &'s str,
    },
    /// `path|helper`
    Pipe {
        /// Value path
        path: &'s str,
        /// Helper name
        helper: &'s str,
    },
    /// Plain `path`
    Variable(&'s str),
}

/// Classify a tag's trimmed inner text
pub fn classify_tag(inner: &str) -> InlineTag<'_> {
    if let Some(block) = classify_block_tag(inner) {
        return InlineTag::Block(block);
    }
    if inner.starts_with('#') || inner.starts_with('/') {
        return InlineTag::UnknownBlock(inner);
    }
    if let Some(rest) = inner.strip_prefix(HELPER_CALL_PREFIX) {
        let rest = rest.trim();
        let (name, args) = match rest.find(char::is_whitespace) {
            Some(pos) => (&rest[..pos], rest[pos..].trim()),
            None => (rest, ""),
        };
        return InlineTag::HelperCall { name, args };
    }
    if let Some((path, helper)) = inner.split_once('|') {
        return InlineTag::Pipe {
            path: path.trim(),
            helper: helper.trim(),
        };
    }
    InlineTag::Variable(inner)
}

/// Split named-call arguments on whitespace
///
/// Double-quoted tokens are string literals (and may contain spaces); numbers,
/// `true`, `false` and `null` are literals; anything else is a path.
pub fn parse_helper_args(input: &str) -> Vec<HelperArg> {
    let mut args = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch == '"' {
            chars.next();
            let mut literal = String::new();
            for (_, c) in chars.by_ref() {
                if c == '"' {
                    break;
                }
                literal.push(c);
            }
            args.push(HelperArg::Literal(Value::String(literal)));
            continue;
        }

        let mut end = input.len();
        while let Some(&(idx, c)) = chars.peek() {
            if c.is_whitespace() {
                end = idx;
                break;
            }
            chars.next();
        }
        args.push(token_arg(&input[start..end]));
    }

    args
}

fn token_arg(token: &str) -> HelperArg {
    match token {
        "true" => HelperArg::Literal(Value::Bool(true)),
        "false" => HelperArg::Literal(Value::Bool(false)),
        "null" => HelperArg::Literal(Value::Null),
        _ => match serde_json::from_str::<serde_json::Number>(token) {
            Ok(number) => HelperArg::Literal(Value::Number(number)),
            Err(_) => HelperArg::Path(token.to_string()),
        },
    }
}

/// Parsed template structure; the compiled form kept by the cache
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    /// Template elements
    pub elements: Vec<TemplateElement>,
    /// Root context names referenced outside loop bodies, plus loop collections
    pub placeholder_names: BTreeSet<String>,
    /// Helper names referenced anywhere
    pub helper_names: BTreeSet<String>,
}

impl ParsedTemplate {
    fn new(elements: Vec<TemplateElement>) -> Self {
        let mut placeholder_names = BTreeSet::new();
        let mut helper_names = BTreeSet::new();
        collect_names(&elements, false, &mut placeholder_names, &mut helper_names);
        Self {
            elements,
            placeholder_names,
            helper_names,
        }
    }
}

fn root_name(path: &str) -> Option<&str> {
    let head = path.split('.').next()?.trim();
    if head.is_empty() || head.starts_with('@') || head == "this" {
        None
    } else {
        Some(head)
    }
}

fn collect_names(
    elements: &[TemplateElement],
    in_loop: bool,
    placeholders: &mut BTreeSet<String>,
    helpers: &mut BTreeSet<String>,
) {
    let note = |path: &str, placeholders: &mut BTreeSet<String>| {
        if !in_loop {
            if let Some(name) = root_name(path) {
                placeholders.insert(name.to_string());
            }
        }
    };

    for element in elements {
        match element {
            TemplateElement::Text(_) => {}
            TemplateElement::Variable(path) => note(path, placeholders),
            TemplateElement::Pipe { path, helper } => {
                note(path, placeholders);
                helpers.insert(helper.clone());
            }
            TemplateElement::HelperCall { name, args } => {
                helpers.insert(name.clone());
                for arg in args {
                    if let HelperArg::Path(path) = arg {
                        note(path, placeholders);
                    }
                }
            }
            TemplateElement::Conditional { condition, content } => {
                note(condition, placeholders);
                collect_names(content, in_loop, placeholders, helpers);
            }
            TemplateElement::Loop { variable, content } => {
                note(variable, placeholders);
                collect_names(content, true, placeholders, helpers);
            }
        }
    }
}

/// Template parser
pub struct TemplateParser;

impl TemplateParser {
    /// Parse template content, failing on unbalanced or interleaved blocks
    ///
    /// # Returns
    /// Parsed template structure or error with line number
    pub fn parse(content: &str) -> Result<ParsedTemplate> {
        check_nesting(content)?;
        let parser = Parser {
            source: content,
            strict: true,
        };
        Ok(ParsedTemplate::new(parser.parse_range(0..content.len(), 0)?))
    }

    /// Parse template content, keeping unpaired block tags as literal text
    pub fn parse_lenient(content: &str) -> ParsedTemplate {
        let parser = Parser {
            source: content,
            strict: false,
        };
        match parser.parse_range(0..content.len(), 0) {
            Ok(elements) => ParsedTemplate::new(elements),
            // Lenient parsing never reports structural errors.
            Err(_) => ParsedTemplate::new(vec![TemplateElement::Text(content.to_string())]),
        }
    }

    /// Root placeholder names referenced by a template
    pub fn extract_placeholders(content: &str) -> Result<Vec<String>> {
        let parsed = Self::parse(content)?;
        Ok(parsed.placeholder_names.into_iter().collect())
    }
}

/// Fail when block start tags stack up deeper than [`MAX_NESTING_DEPTH`]
fn check_nesting(source: &str) -> Result<()> {
    let mut depth = 0usize;
    for tag in scan_tags(source).tags {
        match classify_block_tag(tag.inner) {
            Some(BlockTag::Open { .. }) => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return Err(TemplateError::InvalidSyntax {
                        line: line_of(source, tag.start),
                        message: format!("Blocks nested deeper than {} levels", MAX_NESTING_DEPTH),
                    });
                }
            }
            Some(BlockTag::Close(_)) => depth = depth.saturating_sub(1),
            None => {}
        }
    }
    Ok(())
}

/// Internal parser over one source string
struct Parser<'s> {
    source: &'s str,
    strict: bool,
}

impl<'s> Parser<'s> {
    fn parse_range(&self, range: Range<usize>, depth: usize) -> Result<Vec<TemplateElement>> {
        let base = range.start;
        let segment = &self.source[range];
        let tags = scan_tags(segment).tags;

        // Strict parses were already depth-checked, so only lenient ones stop here.
        if depth >= MAX_NESTING_DEPTH {
            let mut elements = Vec::new();
            self.push_inline(segment, &tags, 0..segment.len(), &mut elements);
            return Ok(elements);
        }

        let mut candidates: Vec<BlockSpan> = Vec::new();
        for family in BlockFamily::ALL {
            let scan = BlockMatcher::scan_in(&tags, family);
            if self.strict {
                if let Some(&offset) = scan.unclosed.first() {
                    return Err(self.syntax_error(
                        base + offset,
                        format!("Unclosed {{{{#{}}}}}", family.keyword()),
                    ));
                }
                if let Some(&offset) = scan.unmatched_closes.first() {
                    return Err(self.syntax_error(
                        base + offset,
                        format!("Unexpected {{{{/{}}}}} without an open block", family.keyword()),
                    ));
                }
            }
            candidates.extend(scan.blocks);
        }
        candidates.sort_by_key(|b| b.open_tag.start);

        // Keep only the outermost blocks across both families.
        let mut selected: Vec<BlockSpan> = Vec::new();
        for block in candidates {
            if let Some(outer) = selected.last() {
                if block.open_tag.start < outer.close_tag.end {
                    if block.close_tag.end > outer.close_tag.end && self.strict {
                        return Err(self.syntax_error(
                            base + block.open_tag.start,
                            format!(
                                "{{{{#{}}}}} overlaps {{{{#{}}}}} without nesting inside it",
                                block.family.keyword(),
                                outer.family.keyword()
                            ),
                        ));
                    }
                    continue;
                }
            }
            selected.push(block);
        }

        let mut elements = Vec::new();
        let mut cursor = 0;
        for block in &selected {
            self.push_inline(segment, &tags, cursor..block.open_tag.start, &mut elements);
            let content_range = block.content_range();
            let content =
                self.parse_range(base + content_range.start..base + content_range.end, depth + 1)?;
            elements.push(match block.family {
                BlockFamily::If => TemplateElement::Conditional {
                    condition: block.argument.clone(),
                    content,
                },
                BlockFamily::Each => TemplateElement::Loop {
                    variable: block.argument.clone(),
                    content,
                },
            });
            cursor = block.close_tag.end;
        }
        self.push_inline(segment, &tags, cursor..segment.len(), &mut elements);

        Ok(elements)
    }

    /// Emit the text and inline tags of `range`, which contains no matched blocks
    fn push_inline(
        &self,
        segment: &str,
        tags: &[Tag<'_>],
        range: Range<usize>,
        elements: &mut Vec<TemplateElement>,
    ) {
        let mut cursor = range.start;
        for tag in tags
            .iter()
            .filter(|t| t.start >= range.start && t.end <= range.end)
        {
            push_text(elements, &segment[cursor..tag.start]);
            match classify_tag(tag.inner) {
                InlineTag::Block(_) | InlineTag::UnknownBlock(_) => {
                    push_text(elements, &segment[tag.start..tag.end]);
                }
                InlineTag::Variable(path) => {
                    elements.push(TemplateElement::Variable(path.to_string()));
                }
                InlineTag::Pipe { path, helper } => elements.push(TemplateElement::Pipe {
                    path: path.to_string(),
                    helper: helper.to_string(),
                }),
                InlineTag::HelperCall { name, args } => elements.push(TemplateElement::HelperCall {
                    name: name.to_string(),
                    args: parse_helper_args(args),
                }),
            }
            cursor = tag.end;
        }
        push_text(elements, &segment[cursor..range.end]);
    }

    fn syntax_error(&self, offset: usize, message: String) -> TemplateError {
        TemplateError::InvalidSyntax {
            line: line_of(self.source, offset),
            message,
        }
    }
}

fn push_text(elements: &mut Vec<TemplateElement>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(TemplateElement::Text(existing)) = elements.last_mut() {
        existing.push_str(text);
    } else {
        elements.push(TemplateElement::Text(text.to_string()));
    }
}
