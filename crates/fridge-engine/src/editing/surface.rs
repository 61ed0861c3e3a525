//! The host side of editing.
//!
//! A [`Surface`] is whatever actually displays the visual tree and owns the
//! live selection: a browser DOM, a terminal view, a native text widget. The
//! controller only ever reads the tree, replaces it wholesale, and moves the
//! selection.

use crate::selection::{Position, VisualPoint, VisualRange, locate, materialize};
use crate::text::{byte_index, utf16_len, utf16_offset};
use crate::visual::{Element, VisualNode};

pub trait Surface {
    fn root(&self) -> &VisualNode;

    /// Swap in a freshly rendered tree. Any existing selection is invalid
    /// afterwards until [`Surface::set_selection`] is called.
    fn replace_root(&mut self, root: VisualNode);

    fn selection(&self) -> Option<VisualRange>;

    fn set_selection(&mut self, range: Option<VisualRange>);

    /// Logical position of the caret (the selection's start point)
    fn caret(&self) -> Option<Position> {
        let range = self.selection()?;
        locate(self.root(), &range.start)
    }

    /// Collapse the selection onto a logical position; false when the
    /// position's block is not on the surface
    fn set_caret(&mut self, position: &Position) -> bool {
        match materialize(self.root(), position) {
            Some(point) => {
                self.set_selection(Some(VisualRange::caret(point)));
                true
            }
            None => false,
        }
    }
}

/// Headless surface that keeps the visual tree in memory.
///
/// Besides the [`Surface`] contract it implements a host's default editing
/// behaviour (inserting typed text, deleting one character backwards), so the
/// controller can be driven exactly as a real front-end would drive it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemorySurface {
    root: VisualNode,
    selection: Option<VisualRange>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new(Element::new("div").into())
    }
}

impl MemorySurface {
    pub fn new(root: VisualNode) -> Self {
        Self {
            root,
            selection: None,
        }
    }

    /// Default text insertion at the caret.
    ///
    /// A selection inside one text node is replaced; any other selection is
    /// collapsed to its start first. Returns false when there is no caret.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let Some(range) = self.selection.clone() else {
            return false;
        };
        let mut at = range.start.clone();
        if range.start.path == range.end.path {
            let (lo, hi) = if range.start.offset <= range.end.offset {
                (range.start.offset, range.end.offset)
            } else {
                (range.end.offset, range.start.offset)
            };
            if let Some(VisualNode::Text(existing)) = self.root.get_mut(&range.start.path) {
                let (from, to) = (byte_index(existing, lo), byte_index(existing, hi));
                existing.replace_range(from..to, "");
            }
            at.offset = lo;
        }

        let inserted = utf16_len(text);
        let Some(node) = self.root.get_mut(&at.path) else {
            return false;
        };

        let caret = match node {
            VisualNode::Text(existing) => {
                let offset = at.offset.min(utf16_len(existing));
                let byte = byte_index(existing, offset);
                existing.insert_str(byte, text);
                VisualPoint::new(at.path, offset + inserted)
            }
            VisualNode::Element(el) => {
                let index = at.offset.min(el.children.len());
                if is_placeholder_only(el) {
                    el.children = vec![VisualNode::text(text)];
                    child_point(&at.path, 0, inserted)
                } else if let Some(VisualNode::Text(prev)) =
                    index.checked_sub(1).and_then(|i| el.children.get_mut(i))
                {
                    prev.push_str(text);
                    let end = utf16_len(prev);
                    child_point(&at.path, index - 1, end)
                } else {
                    el.children.insert(index, VisualNode::text(text));
                    child_point(&at.path, index, inserted)
                }
            }
        };
        self.selection = Some(VisualRange::caret(caret));
        true
    }

    /// Default backspace: remove one character before a caret inside a text
    /// node. Anything else is left untouched and reported as false.
    pub fn delete_backward(&mut self) -> bool {
        let Some(range) = self.selection.clone().filter(VisualRange::is_collapsed) else {
            return false;
        };
        let Some(VisualNode::Text(existing)) = self.root.get_mut(&range.start.path) else {
            return false;
        };
        let end = byte_index(existing, range.start.offset);
        let Some(c) = existing[..end].chars().next_back() else {
            return false;
        };
        let start = end - c.len_utf8();
        let offset = utf16_offset(existing, start);
        existing.replace_range(start..end, "");

        self.selection = Some(VisualRange::caret(VisualPoint::new(
            range.start.path,
            offset,
        )));
        true
    }
}

fn is_placeholder_only(el: &Element) -> bool {
    matches!(el.children.as_slice(), [VisualNode::Element(br)] if br.tag == "br")
}

fn child_point(parent: &[usize], index: usize, offset: usize) -> VisualPoint {
    let mut path = parent.to_vec();
    path.push(index);
    VisualPoint::new(path, offset)
}

impl Surface for MemorySurface {
    fn root(&self) -> &VisualNode {
        &self.root
    }

    fn replace_root(&mut self, root: VisualNode) {
        self.root = root;
        self.selection = None;
    }

    fn selection(&self) -> Option<VisualRange> {
        self.selection.clone()
    }

    fn set_selection(&mut self, range: Option<VisualRange>) {
        self.selection = range;
    }
}
