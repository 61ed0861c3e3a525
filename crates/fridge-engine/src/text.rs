//! UTF-16 code-unit helpers.
//!
//! Positions, search spans and markup tokens all count UTF-16 code units so that
//! offsets agree with what a host text surface reports. Block text itself is
//! stored as UTF-8, so every slice goes through these conversions.

use std::borrow::Cow;

/// Length of `text` in UTF-16 code units
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Convert a UTF-16 offset to a byte index into `text`.
///
/// Offsets past the end clamp to `text.len()`. An offset that lands inside a
/// surrogate pair snaps back to the start of that character.
pub fn byte_index(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units >= utf16_offset {
            return byte;
        }
        let next = units + ch.len_utf16();
        if next > utf16_offset {
            return byte;
        }
        units = next;
    }
    text.len()
}

/// Convert a byte index into `text` to a UTF-16 offset.
pub fn utf16_offset(text: &str, byte: usize) -> usize {
    let byte = byte.min(text.len());
    text.char_indices()
        .take_while(|(i, _)| *i < byte)
        .map(|(_, ch)| ch.len_utf16())
        .sum()
}

/// Split `text` at a UTF-16 offset (clamped).
pub fn split_utf16(text: &str, offset: usize) -> (&str, &str) {
    text.split_at(byte_index(text, offset))
}

/// Substring between two UTF-16 offsets. `end < start` yields an empty string.
pub fn slice_utf16(text: &str, start: usize, end: usize) -> &str {
    let s = byte_index(text, start);
    let e = byte_index(text, end).max(s);
    &text[s..e]
}

/// Normalize CRLF and lone CR to `\n`
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}
