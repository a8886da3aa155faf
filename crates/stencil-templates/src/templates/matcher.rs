//! Tag scanning and block matching
//!
//! Locates `{{...}}` tags and pairs block start/end tags of one family while
//! counting nesting, so `{{#if}}` inside `{{#if}}` pairs with the right
//! `{{/if}}`. Depth is tracked per family; an `{{#each}}` inside an
//! `{{#if}}` does not affect `if` matching and vice versa.

use std::ops::Range;

use crate::error::{Result, TemplateError};

/// A `{{...}}` tag located in a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'s> {
    /// Byte offset of the opening `{{`
    pub start: usize,
    /// Byte offset just past the closing `}}`
    pub end: usize,
    /// Trimmed text between the braces
    pub inner: &'s str,
}

/// Every complete tag in a template plus the first unterminated `{{`, if any
#[derive(Debug, Clone, Default)]
pub struct TagScan<'s> {
    /// Tags in source order
    pub tags: Vec<Tag<'s>>,
    /// Offset of a `{{` that has no closing `}}`
    pub unterminated: Option<usize>,
}

/// Scan `source` for tags
pub fn scan_tags(source: &str) -> TagScan<'_> {
    let mut scan = TagScan::default();
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find("{{") {
        let start = cursor + found;
        match source[start + 2..].find("}}") {
            Some(len) => {
                let end = start + 2 + len + 2;
                scan.tags.push(Tag {
                    start,
                    end,
                    inner: source[start + 2..start + 2 + len].trim(),
                });
                cursor = end;
            }
            None => {
                scan.unterminated = Some(start);
                break;
            }
        }
    }

    scan
}

/// Block kinds understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFamily {
    /// `{{#if x}}...{{/if}}`
    If,
    /// `{{#each x}}...{{/each}}`
    Each,
}

impl BlockFamily {
    /// Both families
    pub const ALL: [BlockFamily; 2] = [BlockFamily::If, BlockFamily::Each];

    /// Keyword following `#` or `/`
    pub fn keyword(&self) -> &'static str {
        match self {
            BlockFamily::If => "if",
            BlockFamily::Each => "each",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "if" => Some(BlockFamily::If),
            "each" => Some(BlockFamily::Each),
            _ => None,
        }
    }
}

/// Classification of a block-structure tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag<'s> {
    /// `#if arg` / `#each arg`
    Open {
        /// Block family
        family: BlockFamily,
        /// Trimmed argument text
        argument: &'s str,
    },
    /// `/if` / `/each`
    Close(BlockFamily),
}

/// Classify a tag's inner text; `None` for anything that is not a known block tag
pub fn classify_block_tag(inner: &str) -> Option<BlockTag<'_>> {
    if let Some(rest) = inner.strip_prefix('#') {
        let rest = rest.trim_start();
        let (keyword, argument) = match rest.find(char::is_whitespace) {
            Some(pos) => (&rest[..pos], rest[pos..].trim()),
            None => (rest, ""),
        };
        return BlockFamily::from_keyword(keyword).map(|family| BlockTag::Open { family, argument });
    }
    if let Some(rest) = inner.strip_prefix('/') {
        return BlockFamily::from_keyword(rest.trim()).map(BlockTag::Close);
    }
    None
}

/// A matched top-level block with its exact source span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Block family
    pub family: BlockFamily,
    /// Argument of the start tag (condition or collection path)
    pub argument: String,
    /// Span of the start tag
    pub open_tag: Range<usize>,
    /// Span of the end tag
    pub close_tag: Range<usize>,
}

impl BlockSpan {
    /// Whole block, start tag through end tag
    pub fn span(&self) -> Range<usize> {
        self.open_tag.start..self.close_tag.end
    }

    /// Body between the tags
    pub fn content_range(&self) -> Range<usize> {
        self.open_tag.end..self.close_tag.start
    }

    /// Body text
    pub fn content<'s>(&self, source: &'s str) -> &'s str {
        &source[self.content_range()]
    }
}

/// Result of scanning one family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockScan {
    /// Top-level blocks in source order
    pub blocks: Vec<BlockSpan>,
    /// Offsets of start tags that were never closed
    pub unclosed: Vec<usize>,
    /// Offsets of end tags with no open block
    pub unmatched_closes: Vec<usize>,
    /// Number of start tags seen
    pub opens: usize,
    /// Number of end tags seen
    pub closes: usize,
}

impl BlockScan {
    /// Whether every tag was paired
    pub fn is_balanced(&self) -> bool {
        self.unclosed.is_empty() && self.unmatched_closes.is_empty()
    }
}

/// Finds top-level blocks of a family
pub struct BlockMatcher;

impl BlockMatcher {
    /// Scan `source` for blocks of `family`, recording unpaired tags instead of failing
    pub fn scan(source: &str, family: BlockFamily) -> BlockScan {
        Self::scan_in(&scan_tags(source).tags, family)
    }

    /// Same as [`BlockMatcher::scan`] over tags that were already located
    pub fn scan_in(tags: &[Tag<'_>], family: BlockFamily) -> BlockScan {
        let mut scan = BlockScan::default();
        // Open start tags, outermost first
        let mut open: Vec<&Tag<'_>> = Vec::new();

        for tag in tags {
            match classify_block_tag(tag.inner) {
                Some(BlockTag::Open { family: f, .. }) if f == family => {
                    scan.opens += 1;
                    open.push(tag);
                }
                Some(BlockTag::Close(f)) if f == family => {
                    scan.closes += 1;
                    let Some(start) = open.pop() else {
                        scan.unmatched_closes.push(tag.start);
                        continue;
                    };
                    if open.is_empty() {
                        let argument = match classify_block_tag(start.inner) {
                            Some(BlockTag::Open { argument, .. }) => argument.to_string(),
                            _ => String::new(),
                        };
                        scan.blocks.push(BlockSpan {
                            family,
                            argument,
                            open_tag: start.start..start.end,
                            close_tag: tag.start..tag.end,
                        });
                    }
                }
                _ => {}
            }
        }

        scan.unclosed = open.iter().map(|t| t.start).collect();
        scan
    }

    /// Top-level blocks of `family`; fails on any unpaired tag
    pub fn find_blocks(source: &str, family: BlockFamily) -> Result<Vec<BlockSpan>> {
        let scan = Self::scan(source, family);
        if let Some(&offset) = scan.unclosed.first() {
            return Err(TemplateError::InvalidSyntax {
                line: line_of(source, offset),
                message: format!("Unclosed {{{{#{}}}}}", family.keyword()),
            });
        }
        if let Some(&offset) = scan.unmatched_closes.first() {
            return Err(TemplateError::InvalidSyntax {
                line: line_of(source, offset),
                message: format!("Unexpected {{{{/{}}}}}", family.keyword()),
            });
        }
        Ok(scan.blocks)
    }
}

/// 1-based line number of a byte offset
pub fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())].matches('\n').count() + 1
}
