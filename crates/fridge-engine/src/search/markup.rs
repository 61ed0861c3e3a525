//! Span markup: split a block's text into runs for highlight and whitespace
//! visualization.
//!
//! The tokenizer walks the text once, left to right. A search span that starts
//! at the current position becomes one or more highlight tokens; outside spans,
//! characters coalesce into plain text runs. When enabled, ASCII spaces,
//! ideographic spaces and newlines break the current run and get a marker token
//! of their own, inside or outside a highlight.

use serde::{Deserialize, Serialize};

use crate::models::Document;
use crate::search::{FoundSpan, SearchResult, block_spans};
use crate::visual::{ATTR_NODE_ID, Element, VisualNode, render};

const HALF_SPACE: char = ' ';
const FULL_SPACE: char = '\u{3000}';
const ZERO_WIDTH_SPACE: &str = "\u{200B}";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupOptions {
    pub show_half_space: bool,
    pub show_full_space: bool,
    pub show_newline: bool,
    pub highlight_search: bool,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            show_half_space: false,
            show_full_space: false,
            show_newline: false,
            highlight_search: true,
        }
    }
}

impl MarkupOptions {
    fn marker_for(&self, c: char) -> Option<TokenKind> {
        match c {
            HALF_SPACE if self.show_half_space => Some(TokenKind::HalfSpace),
            FULL_SPACE if self.show_full_space => Some(TokenKind::FullSpace),
            '\n' if self.show_newline => Some(TokenKind::Newline),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Text,
    HalfSpace,
    FullSpace,
    Newline,
    SearchHighlight,
    /// Stands in for empty text so the line keeps its height
    Placeholder,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub content: String,
    /// UTF-16 offsets into the tokenized text
    pub start: usize,
    pub end: usize,
    /// Index of the originating span (after sorting by start)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_index: Option<usize>,
}

impl Token {
    fn new(kind: TokenKind, content: String, start: usize, end: usize) -> Self {
        Self {
            kind,
            content,
            start,
            end,
            search_index: None,
        }
    }
}

/// Tokenize `text` against search spans (UTF-16 offsets).
///
/// Spans are considered in start order. A span only takes effect when the
/// scan lands exactly on its start, so spans overlapping an earlier one are
/// ignored. Empty text yields a single [`TokenKind::Placeholder`].
pub fn tokenize(text: &str, spans: &[FoundSpan], options: &MarkupOptions) -> Vec<Token> {
    if text.is_empty() {
        return vec![Token::new(
            TokenKind::Placeholder,
            ZERO_WIDTH_SPACE.to_string(),
            0,
            0,
        )];
    }

    let mut sorted: Vec<FoundSpan> = spans.to_vec();
    sorted.sort_by_key(|s| s.start);
    let active: &[FoundSpan] = if options.highlight_search { &sorted } else { &[] };
    let mut cursor = SpanCursor {
        spans: active,
        next: 0,
    };

    // (utf16 offset, char) pairs so span boundaries can be compared directly
    let chars: Vec<(usize, char)> = text
        .chars()
        .scan(0, |pos, c| {
            let at = *pos;
            *pos += c.len_utf16();
            Some((at, c))
        })
        .collect();

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];

        if let Some((index, span)) = cursor.take(pos) {
            let mut run = String::new();
            let mut run_start = pos;
            while i < chars.len() && chars[i].0 < span.end {
                let (at, c) = chars[i];
                if let Some(kind) = options.marker_for(c) {
                    flush_highlight(&mut tokens, &mut run, run_start, at, index);
                    tokens.push(Token::new(kind, c.to_string(), at, at + c.len_utf16()));
                    run_start = at + c.len_utf16();
                } else {
                    run.push(c);
                }
                i += 1;
            }
            let end = chars.get(i).map_or(end_of(&chars), |(at, _)| *at);
            flush_highlight(&mut tokens, &mut run, run_start, end, index);
            continue;
        }

        if let Some(kind) = options.marker_for(c) {
            tokens.push(Token::new(kind, c.to_string(), pos, pos + c.len_utf16()));
            i += 1;
            continue;
        }

        let mut run = String::new();
        while i < chars.len() {
            let (at, c) = chars[i];
            if options.marker_for(c).is_some() || cursor.peek(at).is_some() {
                break;
            }
            run.push(c);
            i += 1;
        }
        let end = chars.get(i).map_or(end_of(&chars), |(at, _)| *at);
        tokens.push(Token::new(TokenKind::Text, run, pos, end));
    }

    tokens
}

/// Walks start-sorted spans alongside a forward scan of the text. Spans
/// whose start the scan has already passed are skipped for good.
struct SpanCursor<'a> {
    spans: &'a [FoundSpan],
    next: usize,
}

impl SpanCursor<'_> {
    fn peek(&mut self, pos: usize) -> Option<(usize, FoundSpan)> {
        while self.spans.get(self.next).is_some_and(|s| s.start < pos) {
            self.next += 1;
        }
        self.spans
            .get(self.next)
            .filter(|s| s.start == pos)
            .map(|s| (self.next, *s))
    }

    fn take(&mut self, pos: usize) -> Option<(usize, FoundSpan)> {
        let found = self.peek(pos)?;
        self.next += 1;
        Some(found)
    }
}

fn end_of(chars: &[(usize, char)]) -> usize {
    chars.last().map_or(0, |(at, c)| at + c.len_utf16())
}

fn flush_highlight(tokens: &mut Vec<Token>, run: &mut String, start: usize, end: usize, index: usize) {
    if run.is_empty() {
        return;
    }
    tokens.push(Token {
        kind: TokenKind::SearchHighlight,
        content: std::mem::take(run),
        start,
        end,
        search_index: Some(index),
    });
}

/// Render tokens as HTML for display
pub fn to_html(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| match token.kind {
            TokenKind::Text => escape(&token.content),
            TokenKind::HalfSpace => r#"<span class="hs">.</span>"#.to_string(),
            TokenKind::FullSpace => r#"<span class="fs">・</span>"#.to_string(),
            TokenKind::Newline => r#"<span class="nl"></span><br/>"#.to_string(),
            TokenKind::SearchHighlight => format!(
                r#"<span class="search-highlight" data-search-index="{}">{}</span>"#,
                token.search_index.unwrap_or_default(),
                escape(&token.content)
            ),
            TokenKind::Placeholder => ZERO_WIDTH_SPACE.to_string(),
        })
        .collect()
}

fn escape(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Render tokens as visual nodes.
///
/// Markers keep their original character as text and the placeholder becomes
/// a line break, so a block rendered this way reads back to the same text.
pub fn to_visual(tokens: &[Token]) -> Vec<VisualNode> {
    tokens
        .iter()
        .map(|token| match token.kind {
            TokenKind::Text => VisualNode::text(token.content.as_str()),
            TokenKind::HalfSpace => marker("hs", &token.content),
            TokenKind::FullSpace => marker("fs", &token.content),
            TokenKind::Newline => marker("nl", &token.content),
            TokenKind::SearchHighlight => Element::new("span")
                .with_attr("class", "search-highlight")
                .with_attr(
                    "data-search-index",
                    token.search_index.unwrap_or_default().to_string(),
                )
                .with_child(VisualNode::text(token.content.as_str()))
                .into(),
            TokenKind::Placeholder => Element::new("br").into(),
        })
        .collect()
}

fn marker(class: &str, content: &str) -> VisualNode {
    Element::new("span")
        .with_attr("class", class)
        .with_child(VisualNode::text(content))
        .into()
}

/// Render a document with every text block's content replaced by its markup.
///
/// The result is still a fully tagged tree: reconstruction and position
/// mapping work on it exactly as on a plain render.
pub fn render_marked(
    doc: &Document,
    result: Option<&SearchResult>,
    options: &MarkupOptions,
) -> VisualNode {
    let mut root = render(doc);
    let projected = result.map(|r| block_spans(doc, r)).unwrap_or_default();

    let Some(root_el) = root.as_element_mut() else {
        return root;
    };
    for (child, block) in root_el.children.iter_mut().zip(doc.blocks()) {
        let Some(text) = block.text() else {
            continue;
        };
        let Some(el) = child.as_element_mut() else {
            continue;
        };
        debug_assert_eq!(el.attr(ATTR_NODE_ID), Some(block.id().as_str()));
        let spans = projected.get(block.id()).map_or(&[][..], Vec::as_slice);
        el.children = to_visual(&tokenize(text, spans, options));
    }
    root
}
