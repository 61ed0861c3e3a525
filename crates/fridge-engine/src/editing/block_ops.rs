//! Pure block transformations used by split, merge and range delete.
//!
//! Every function here returns new blocks with fresh ids; callers that need
//! identity continuity put the result in place with [`Document::replace`],
//! which hands the old id over.
//!
//! [`Document::replace`]: crate::models::Document::replace

use crate::models::Block;
use crate::text::{split_utf16, utf16_len};

/// Remove the `[start, end)` UTF-16 range from a text block.
///
/// `None` bounds mean "from the beginning" and "to the end". The result keeps
/// the block's type and heading level, even when it ends up empty. Images
/// have no text to delete from and yield `None`.
pub fn delete_with_range(block: &Block, start: Option<usize>, end: Option<usize>) -> Option<Block> {
    let text = block.text()?;
    let len = utf16_len(text);
    let start = start.unwrap_or(0).min(len);
    let end = end.unwrap_or(len).clamp(start, len);

    let (before, rest) = split_utf16(text, start);
    let (_, after) = split_utf16(rest, end - start);
    block.with_text(format!("{before}{after}"))
}

/// Split a text block at a UTF-16 offset.
///
/// The first half keeps the block's type (a heading stays a heading at the
/// same level); the second half is always a paragraph.
pub fn split_at(block: &Block, offset: usize) -> Option<(Block, Block)> {
    let text = block.text()?;
    let (before, after) = split_utf16(text, offset);
    Some((block.with_text(before)?, Block::paragraph(after)))
}

/// Join `prefix` and `suffix` into a block shaped like `start` (type and level)
pub fn concat(start: &Block, prefix: &str, suffix: &str) -> Option<Block> {
    start.with_text(format!("{prefix}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeadingLevel, NodeType};
    use rstest::rstest;

    #[rstest]
    #[case("Hello", Some(1), Some(4), "Ho")]
    #[case("Hello", None, Some(2), "llo")]
    #[case("Hello", Some(3), None, "Hel")]
    #[case("Hello", Some(2), Some(2), "Hello")]
    #[case("Hello", Some(4), Some(1), "Hello")]
    #[case("Hello", Some(0), Some(99), "")]
    #[case("見出し内容", Some(1), Some(3), "見内容")]
    fn test_delete_with_range(
        #[case] text: &str,
        #[case] start: Option<usize>,
        #[case] end: Option<usize>,
        #[case] expected: &str,
    ) {
        let block = Block::paragraph(text);
        let result = delete_with_range(&block, start, end).unwrap();
        assert_eq!(result.to_plain(), expected);
        assert_eq!(result.node_type(), NodeType::Paragraph);
    }

    #[test]
    fn test_delete_with_range_keeps_heading_level() {
        let block = Block::heading("Chapter", HeadingLevel::H2);
        let Block::Heading(h) = delete_with_range(&block, Some(0), None).unwrap() else {
            panic!("expected heading");
        };
        assert_eq!(h.text, "");
        assert_eq!(h.level, HeadingLevel::H2);
    }

    #[test]
    fn test_delete_with_range_image_is_none() {
        assert!(delete_with_range(&Block::image("a.png"), None, None).is_none());
    }

    #[test]
    fn test_split_paragraph() {
        let block = Block::paragraph("abcdef");
        let (before, after) = split_at(&block, 3).unwrap();
        assert_eq!(before.to_plain(), "abc");
        assert_eq!(after.to_plain(), "def");
        assert_eq!(format!("{before}{after}"), "abcdef");
    }

    #[test]
    fn test_split_heading_second_half_is_paragraph() {
        let block = Block::heading("見出し内容", HeadingLevel::H1);
        let (before, after) = split_at(&block, 2).unwrap();
        assert_eq!(before.node_type(), NodeType::Heading);
        assert_eq!(before.to_plain(), "見出");
        assert_eq!(after.node_type(), NodeType::Paragraph);
        assert_eq!(after.to_plain(), "し内容");
    }

    #[test]
    fn test_split_at_end_gives_empty_paragraph() {
        let (before, after) = split_at(&Block::paragraph("Hello"), 5).unwrap();
        assert_eq!(before.to_plain(), "Hello");
        assert_eq!(after.to_plain(), "");
    }

    #[test]
    fn test_concat_uses_start_shape() {
        let start = Block::heading("He", HeadingLevel::H3);
        let merged = concat(&start, "He", "ld").unwrap();
        assert_eq!(merged.to_plain(), "Held");
        assert_eq!(merged.node_type(), NodeType::Heading);
    }
}
