//! Substring and pattern search over plain text.
//!
//! Spans are UTF-16 code-unit offsets, the same unit as
//! [`Position::offset`](crate::selection::Position), so a span can be handed
//! straight to the selection mapper or the markup renderer.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{Document, NodeId};
use crate::text::utf16_len;

pub mod markup;

pub use markup::{MarkupOptions, Token, TokenKind, render_marked, to_html, to_visual, tokenize};

/// Display bound on the number of spans one search returns
pub const MAX_MATCHES: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Query {
    Literal(String),
    Pattern(String),
}

impl Query {
    pub fn literal(text: impl Into<String>) -> Self {
        Query::Literal(text.into())
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Query::Pattern(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Query::Literal(s) | Query::Pattern(s) => s,
        }
    }
}

/// Half-open `[start, end)` range of UTF-16 code units
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoundSpan {
    pub start: usize,
    pub end: usize,
}

impl FoundSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: Query,
    pub founds: Vec<FoundSpan>,
    /// More matches existed past [`MAX_MATCHES`]
    pub truncated: bool,
}

impl SearchResult {
    pub fn count(&self) -> usize {
        self.founds.len()
    }
}

/// Find sequential, non-overlapping matches of `query` in `text`.
///
/// Stops after [`MAX_MATCHES`] spans. Empty matches (from patterns such as
/// `a*`) carry nothing to highlight and are skipped.
pub fn search(text: &str, query: &Query) -> Result<SearchResult, SearchError> {
    let byte_ranges: Box<dyn Iterator<Item = (usize, usize)> + '_> = match query {
        Query::Literal(needle) if needle.is_empty() => Box::new(std::iter::empty()),
        Query::Literal(needle) => Box::new(
            text.match_indices(needle.as_str())
                .map(|(start, m)| (start, start + m.len())),
        ),
        Query::Pattern(pattern) => {
            let re = Regex::new(pattern)?;
            let ranges: Vec<_> = re
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| (m.start(), m.end()))
                .take(MAX_MATCHES + 1)
                .collect();
            Box::new(ranges.into_iter())
        }
    };

    // Byte offsets come in increasing order, so UTF-16 offsets can be
    // accumulated incrementally instead of rescanning from the start
    let mut founds = Vec::new();
    let mut truncated = false;
    let (mut last_byte, mut last_utf16) = (0, 0);
    for (start, end) in byte_ranges {
        if founds.len() == MAX_MATCHES {
            truncated = true;
            break;
        }
        let start16 = last_utf16 + utf16_len(&text[last_byte..start]);
        let end16 = start16 + utf16_len(&text[start..end]);
        founds.push(FoundSpan::new(start16, end16));
        (last_byte, last_utf16) = (end, end16);
    }

    if truncated {
        log::info!(
            "search for {:?} stopped after {MAX_MATCHES} matches",
            query.as_str()
        );
    }

    Ok(SearchResult {
        query: query.clone(),
        founds,
        truncated,
    })
}

/// Search a whole document's plain text
pub fn search_document(doc: &Document, query: &Query) -> Result<SearchResult, SearchError> {
    search(&doc.to_plain(), query)
}

/// Project document-level spans onto the text blocks they fall in.
///
/// Offsets in `result` are over [`Document::to_plain`]; the returned spans are
/// local to each block. A span crossing a block boundary is clipped into each
/// block it touches. Blocks without any span have no entry.
pub fn block_spans(doc: &Document, result: &SearchResult) -> HashMap<NodeId, Vec<FoundSpan>> {
    let mut out: HashMap<NodeId, Vec<FoundSpan>> = HashMap::new();
    let mut base = 0;

    for block in doc.blocks() {
        let len = utf16_len(block.to_plain());
        let block_end = base + len;

        if block.is_text() {
            let local: Vec<FoundSpan> = result
                .founds
                .iter()
                .filter(|span| span.start < block_end && span.end > base)
                .map(|span| {
                    FoundSpan::new(span.start.max(base) - base, span.end.min(block_end) - base)
                })
                .collect();
            if !local.is_empty() {
                out.insert(block.id().clone(), local);
            }
        }

        // one separator newline between blocks
        base = block_end + 1;
    }
    out
}
