//! Position mapping between the visual tree and logical `(node id, offset)` pairs.
//!
//! Visual points follow DOM range semantics: a point inside a text node counts
//! UTF-16 code units into that text, a point on an element counts child
//! nodes. Logical positions count UTF-16 code units into the owning block's
//! plain text. Nothing here holds on to the tree; every call starts again
//! from the root it is given.

use serde::{Deserialize, Serialize};

use crate::models::{NodeId, NodeType};
use crate::visual::{NodePath, VisualNode};

/// A point inside one block's text
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub node_id: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node_id: NodeId, offset: usize) -> Self {
        Self { node_id, offset }
    }
}

/// A logical range. `start` and `end` are kept exactly as captured, so
/// `start` may come after `end` in reading order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedSelection {
    pub start: Position,
    pub end: Position,
}

impl SerializedSelection {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: Position) -> Self {
        Self {
            start: at.clone(),
            end: at,
        }
    }

    /// Start and end are the same point
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    pub fn is_multi_block(&self) -> bool {
        self.start.node_id != self.end.node_id
    }
}

/// A point in the visual tree, addressed by path from the root
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualPoint {
    pub path: NodePath,
    pub offset: usize,
}

impl VisualPoint {
    pub fn new(path: NodePath, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisualRange {
    pub start: VisualPoint,
    pub end: VisualPoint,
}

impl VisualRange {
    pub fn new(start: VisualPoint, end: VisualPoint) -> Self {
        Self { start, end }
    }

    pub fn caret(at: VisualPoint) -> Self {
        Self {
            start: at.clone(),
            end: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Map a visual point to the block that contains it.
///
/// Walks up from the point to the nearest element carrying a node-id tag,
/// then sums the length of every text node of that block that comes before
/// the point. Returns `None` when the point is not inside any block.
pub fn locate(root: &VisualNode, point: &VisualPoint) -> Option<Position> {
    let container = root.get(&point.path)?;

    let (block_path, node_id) = (0..=point.path.len()).rev().find_map(|depth| {
        let prefix = &point.path[..depth];
        let el = root.get(prefix)?.as_element()?;
        let id = el.node_id()?;
        Some((prefix, id, el.node_type()))
    })
    .and_then(|(prefix, id, ty)| {
        // The document root is tagged too, but a point on it is between blocks
        (ty != Some(NodeType::Document)).then_some((prefix, id))
    })?;

    let block = root.get(block_path)?;
    let relative = &point.path[block_path.len()..];

    // Everything ordered strictly before this path precedes the point
    let boundary: NodePath = match container {
        VisualNode::Text(_) => relative.to_vec(),
        VisualNode::Element(_) => {
            let mut boundary = relative.to_vec();
            boundary.push(point.offset);
            boundary
        }
    };

    let mut offset: usize = block
        .text_nodes()
        .into_iter()
        .filter(|(path, _)| path.as_slice() < boundary.as_slice())
        .map(|(_, len)| len)
        .sum();

    if let VisualNode::Text(text) = container {
        offset += point.offset.min(crate::text::utf16_len(text));
    }

    Some(Position { node_id, offset })
}

/// Map a position back onto the visual tree.
///
/// Offsets past the end of the block clamp to the end of the block. Returns
/// `None` only when no element carries the position's node id.
pub fn materialize(root: &VisualNode, position: &Position) -> Option<VisualPoint> {
    let Some(block_path) = root.find_by_node_id(&position.node_id) else {
        log::debug!("materialize: no element tagged {}", position.node_id);
        return None;
    };
    let block = root.get(&block_path)?;

    let mut remaining = position.offset;
    for (relative, len) in block.text_nodes() {
        if remaining <= len {
            let mut path = block_path.clone();
            path.extend(relative);
            return Some(VisualPoint::new(path, remaining));
        }
        remaining -= len;
    }

    let end = block.children().len();
    Some(VisualPoint::new(block_path, end))
}

/// Capture a visual range as a logical selection
pub fn capture_selection(root: &VisualNode, range: &VisualRange) -> Option<SerializedSelection> {
    Some(SerializedSelection {
        start: locate(root, &range.start)?,
        end: locate(root, &range.end)?,
    })
}

/// Materialize a logical selection, if both ends still exist
pub fn restore_selection(root: &VisualNode, selection: &SerializedSelection) -> Option<VisualRange> {
    Some(VisualRange {
        start: materialize(root, &selection.start)?,
        end: materialize(root, &selection.end)?,
    })
}
