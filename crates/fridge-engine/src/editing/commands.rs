use crate::editing::EditError;
use crate::editing::block_ops::{concat, delete_with_range, split_at};
use crate::models::{Block, Document, HeadingLevel};
use crate::selection::{Position, SerializedSelection};
use crate::text::{normalize_newlines, split_utf16, utf16_len};

/// Structural edit commands
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Split the block at `at`; the second half becomes a new paragraph
    SplitBlock { at: Position },
    /// Remove the selected range, merging blocks when it spans several
    DeleteSelection { selection: SerializedSelection },
    /// Splice text in at `at`; every line after the first becomes a new
    /// paragraph
    InsertText { at: Position, text: String },
    /// Seed an empty document with an empty heading and an empty paragraph
    Bootstrap,
}

/// Apply a command, returning where the caret belongs afterwards.
///
/// On error the document is left exactly as it was.
pub fn apply(doc: &mut Document, cmd: Cmd) -> Result<Position, EditError> {
    let result = match &cmd {
        Cmd::SplitBlock { at } => split_block(doc, at),
        Cmd::DeleteSelection { selection } => delete_in_selection(doc, selection),
        Cmd::InsertText { at, text } => insert_text(doc, at, text),
        Cmd::Bootstrap => Ok(bootstrap(doc)),
    };
    match &result {
        Ok(caret) => log::trace!("applied {cmd:?}, caret at {}:{}", caret.node_id, caret.offset),
        Err(e) => log::warn!("{cmd:?} aborted: {e}"),
    }
    result
}

fn index_of(doc: &Document, position: &Position) -> Result<usize, EditError> {
    doc.index_of(&position.node_id)
        .ok_or_else(|| EditError::NodeNotFound(position.node_id.clone()))
}

fn split_block(doc: &mut Document, at: &Position) -> Result<Position, EditError> {
    let index = index_of(doc, at)?;
    let block = &doc.blocks()[index];

    let new_block = match split_at(block, at.offset) {
        Some((before, after)) => {
            doc.replace(&at.node_id, before)?;
            after
        }
        // Enter on an image opens an empty line after it
        None => Block::paragraph(""),
    };

    let caret = Position::new(new_block.id().clone(), 0);
    doc.insert(index + 1, [new_block]);
    Ok(caret)
}

/// Delete the selected range.
///
/// Within one block the `[start, end)` text is spliced out. Across blocks the
/// start block keeps its prefix, gains the end block's suffix and keeps its
/// own type (a heading keeps its level); everything after it up to and
/// including the end block is removed. The caret lands at the join point.
pub fn delete_in_selection(
    doc: &mut Document,
    selection: &SerializedSelection,
) -> Result<Position, EditError> {
    let start_index = index_of(doc, &selection.start)?;
    let end_index = index_of(doc, &selection.end)?;

    if start_index == end_index {
        let (lo, hi) = ordered(selection.start.offset, selection.end.offset);
        let id = &selection.start.node_id;
        if lo == hi {
            return Ok(Position::new(id.clone(), lo));
        }
        let block = &doc.blocks()[start_index];
        let trimmed =
            delete_with_range(block, Some(lo), Some(hi)).ok_or_else(|| EditError::NotTextBlock(id.clone()))?;
        doc.replace(id, trimmed)?;
        return Ok(Position::new(id.clone(), lo));
    }

    let (first, first_index, last, last_index) = if start_index < end_index {
        (&selection.start, start_index, &selection.end, end_index)
    } else {
        (&selection.end, end_index, &selection.start, start_index)
    };

    let first_block = &doc.blocks()[first_index];
    let last_block = &doc.blocks()[last_index];
    let prefix = first_block
        .text()
        .map_or("", |text| split_utf16(text, first.offset).0);
    let suffix = last_block
        .text()
        .map_or("", |text| split_utf16(text, last.offset).1);

    let merged = concat(first_block, prefix, suffix)
        .unwrap_or_else(|| Block::paragraph(format!("{prefix}{suffix}")));
    let caret = Position::new(first.node_id.clone(), utf16_len(prefix));

    doc.replace(&first.node_id, merged)?;
    doc.drain(first_index + 1..last_index + 1);
    Ok(caret)
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

fn insert_text(doc: &mut Document, at: &Position, text: &str) -> Result<Position, EditError> {
    let index = index_of(doc, at)?;
    let text = normalize_newlines(text);
    let mut lines = text.split('\n');
    let first_line = lines.next().unwrap_or_default();
    let rest: Vec<&str> = lines.collect();

    let anchor = &doc.blocks()[index];
    let Some(anchor_text) = anchor.text() else {
        // Nothing to splice into: every line goes after the image
        let blocks: Vec<Block> = std::iter::once(first_line)
            .chain(rest.iter().copied())
            .map(Block::paragraph)
            .collect();
        let caret = blocks
            .last()
            .map(|b| Position::new(b.id().clone(), utf16_len(b.to_plain())))
            .unwrap_or_else(|| at.clone());
        doc.insert(index + 1, blocks);
        return Ok(caret);
    };

    let (before, after) = split_utf16(anchor_text, at.offset);

    let Some((last_line, middle)) = rest.split_last() else {
        let spliced = anchor
            .with_text(format!("{before}{first_line}{after}"))
            .ok_or_else(|| EditError::NotTextBlock(at.node_id.clone()))?;
        let caret = Position::new(at.node_id.clone(), utf16_len(before) + utf16_len(first_line));
        doc.replace(&at.node_id, spliced)?;
        return Ok(caret);
    };

    let head = anchor
        .with_text(format!("{before}{first_line}"))
        .ok_or_else(|| EditError::NotTextBlock(at.node_id.clone()))?;
    let mut blocks: Vec<Block> = middle.iter().map(|line| Block::paragraph(*line)).collect();
    let tail = Block::paragraph(format!("{last_line}{after}"));
    let caret = Position::new(tail.id().clone(), utf16_len(last_line));
    blocks.push(tail);

    doc.replace(&at.node_id, head)?;
    doc.insert(index + 1, blocks);
    Ok(caret)
}

fn bootstrap(doc: &mut Document) -> Position {
    let heading = Block::heading("", HeadingLevel::H1);
    let caret = Position::new(heading.id().clone(), 0);
    doc.set_blocks(vec![heading, Block::paragraph("")]);
    caret
}
