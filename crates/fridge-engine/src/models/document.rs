use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::editing::EditError;
use crate::models::{Block, HeadingLevel, NodeId, NodeType};
use crate::text::normalize_newlines;

/// How a document's blocks are laid out. Affects presentation only.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Left-to-right rows, blocks stacked top to bottom
    #[default]
    Ltr,
    /// Top-to-bottom columns, blocks placed side by side
    Ttb,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Ltr => "ltr",
            WriteMode::Ttb => "ttb",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ltr" => Ok(WriteMode::Ltr),
            "ttb" => Ok(WriteMode::Ttb),
            _ => Err(()),
        }
    }
}

/// Borrowed view of any node in the tree, as returned by [`Document::find_node`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeRef<'a> {
    Document(&'a Document),
    Block(&'a Block),
}

impl NodeRef<'_> {
    pub fn id(&self) -> &NodeId {
        match self {
            NodeRef::Document(d) => d.id(),
            NodeRef::Block(b) => b.id(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeRef::Document(_) => NodeType::Document,
            NodeRef::Block(b) => b.node_type(),
        }
    }

    pub fn to_plain(&self) -> Cow<'_, str> {
        match self {
            NodeRef::Document(d) => Cow::Owned(d.to_plain()),
            NodeRef::Block(b) => Cow::Borrowed(b.to_plain()),
        }
    }
}

/// Root of the document tree: an ordered list of blocks.
///
/// The document exclusively owns its blocks. Blocks have no parent pointer;
/// lookups by id are linear scans over `children`, which keeps the tree free
/// of an index that could go stale between edits.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    id: NodeId,
    children: Vec<Block>,
    pub mode: WriteMode,
    /// File this document was opened from or last saved to
    pub file_path: Option<PathBuf>,
}

impl Document {
    /// Build a document from a title and plain content.
    ///
    /// A title (even an empty one) becomes a level-1 heading. Each line of
    /// `content` becomes one paragraph, so empty content still yields one
    /// empty paragraph.
    pub fn new(title: Option<&str>, content: &str) -> Self {
        let mut children = Vec::new();
        if let Some(title) = title {
            children.push(Block::heading(title, HeadingLevel::H1));
        }
        children.extend(normalize_newlines(content).split('\n').map(Block::paragraph));

        Self {
            id: NodeId::new(),
            children,
            mode: WriteMode::default(),
            file_path: None,
        }
    }

    /// Assemble a document from already-built parts (used by reconstruction)
    pub fn from_parts(id: NodeId, mode: WriteMode, children: Vec<Block>) -> Self {
        Self {
            id,
            children,
            mode,
            file_path: None,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children joined by `\n`
    pub fn to_plain(&self) -> String {
        self.children
            .iter()
            .map(Block::to_plain)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Plain text of the first block
    pub fn title(&self) -> Option<&str> {
        self.children.first().map(Block::to_plain)
    }

    /// Depth-first search for a node by id, returning the first match.
    ///
    /// Duplicate ids are a defect in the tree; they are logged, and the first
    /// node in reading order still wins.
    pub fn find_node(&self, id: &NodeId) -> Option<NodeRef<'_>> {
        if &self.id == id {
            return Some(NodeRef::Document(self));
        }
        let mut matches = self.children.iter().filter(|b| b.id() == id);
        let first = matches.next()?;
        let extra = matches.count();
        if extra > 0 {
            log::error!("node id {id} is shared by {} blocks", extra + 1);
        }
        Some(NodeRef::Block(first))
    }

    /// Index of a direct child
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.children.iter().position(|b| b.id() == id)
    }

    pub fn block(&self, id: &NodeId) -> Option<&Block> {
        self.children.iter().find(|b| b.id() == id)
    }

    /// Insert blocks at `index` (clamped to the end)
    pub fn insert(&mut self, index: usize, blocks: impl IntoIterator<Item = Block>) {
        let index = index.min(self.children.len());
        self.children.splice(index..index, blocks);
    }

    /// Insert blocks right after the direct child `after_id`.
    ///
    /// Leaves the document untouched when `after_id` is not a direct child.
    pub fn insert_after(
        &mut self,
        after_id: &NodeId,
        blocks: impl IntoIterator<Item = Block>,
    ) -> Result<(), EditError> {
        let Some(index) = self.index_of(after_id) else {
            log::warn!("insert_after: {after_id} is not a child of document {}", self.id);
            return Err(EditError::NodeNotFound(after_id.clone()));
        };
        self.insert(index + 1, blocks);
        Ok(())
    }

    /// Substitute the block `node_id` with `new_block`, which takes over the id.
    ///
    /// This is how a block changes type (or is rebuilt after an edit) while
    /// anything keyed by its id keeps pointing at it.
    pub fn replace(&mut self, node_id: &NodeId, mut new_block: Block) -> Result<(), EditError> {
        let Some(index) = self.index_of(node_id) else {
            log::warn!("replace: {node_id} not found in document {}", self.id);
            return Err(EditError::NodeNotFound(node_id.clone()));
        };
        new_block.set_id(node_id.clone());
        self.children[index] = new_block;
        Ok(())
    }

    pub fn remove(&mut self, node_id: &NodeId) -> Result<Block, EditError> {
        let index = self
            .index_of(node_id)
            .ok_or_else(|| EditError::NodeNotFound(node_id.clone()))?;
        Ok(self.children.remove(index))
    }

    /// Replace all children at once (used when reconciling with the visual tree)
    pub(crate) fn set_blocks(&mut self, blocks: Vec<Block>) {
        self.children = blocks;
    }

    pub(crate) fn drain(&mut self, range: std::ops::Range<usize>) {
        self.children.drain(range);
    }

    /// Check the whole-tree id uniqueness invariant
    pub fn validate_ids(&self) -> Result<(), EditError> {
        let mut seen = HashSet::with_capacity(self.children.len() + 1);
        seen.insert(&self.id);
        for block in &self.children {
            if !seen.insert(block.id()) {
                return Err(EditError::DuplicateId(block.id().clone()));
            }
        }
        Ok(())
    }

    /// Give every block whose id was already seen a fresh id, keeping the
    /// first occurrence. Returns how many blocks were renamed.
    pub(crate) fn repair_duplicate_ids(&mut self) -> usize {
        let mut seen = HashSet::with_capacity(self.children.len() + 1);
        seen.insert(self.id.clone());
        let mut renamed = 0;
        for block in &mut self.children {
            if !seen.insert(block.id().clone()) {
                log::error!("duplicate node id {}, assigning a fresh one", block.id());
                block.set_id(NodeId::new());
                seen.insert(block.id().clone());
                renamed += 1;
            }
        }
        renamed
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(None, "")
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(doc: &Document) -> Vec<&str> {
        doc.blocks().iter().map(Block::to_plain).collect()
    }

    #[test]
    fn test_new_with_title_and_lines() {
        let doc = Document::new(Some("Title"), "one\ntwo\n\nfour");

        assert_eq!(doc.len(), 5);
        assert_eq!(doc.blocks()[0].node_type(), NodeType::Heading);
        assert_eq!(texts(&doc), vec!["Title", "one", "two", "", "four"]);
        assert_eq!(doc.to_plain(), "Title\none\ntwo\n\nfour");
        assert_eq!(doc.title(), Some("Title"));
        assert!(doc.validate_ids().is_ok());
    }

    #[test]
    fn test_new_empty_content_has_one_empty_paragraph() {
        let doc = Document::new(None, "");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.blocks()[0].node_type(), NodeType::Paragraph);
        assert_eq!(doc.to_plain(), "");
    }

    #[test]
    fn test_new_normalizes_crlf() {
        let doc = Document::new(None, "a\r\nb\rc");
        assert_eq!(texts(&doc), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_find_node_document_and_block() {
        let doc = Document::new(Some("T"), "body");
        let doc_id = doc.id().clone();
        let para_id = doc.blocks()[1].id().clone();

        assert_eq!(
            doc.find_node(&doc_id).map(|n| n.node_type()),
            Some(NodeType::Document)
        );
        let found = doc.find_node(&para_id).unwrap();
        assert_eq!(found.node_type(), NodeType::Paragraph);
        assert_eq!(found.to_plain(), "body");
        assert!(doc.find_node(&NodeId::from("missing")).is_none());
    }

    #[test]
    fn test_find_node_duplicate_returns_first() {
        let mut doc = Document::new(None, "first\nsecond");
        let first_id = doc.blocks()[0].id().clone();
        let mut dup = Block::paragraph("second");
        dup.set_id(first_id.clone());
        doc.children[1] = dup;

        assert_eq!(doc.find_node(&first_id).unwrap().to_plain(), "first");
        assert_eq!(doc.validate_ids(), Err(EditError::DuplicateId(first_id.clone())));

        assert_eq!(doc.repair_duplicate_ids(), 1);
        assert!(doc.validate_ids().is_ok());
        assert_eq!(doc.blocks()[0].id(), &first_id);
    }

    #[test]
    fn test_index_of_direct_children_only() {
        let doc = Document::new(None, "a\nb");
        assert_eq!(doc.index_of(doc.blocks()[1].id()), Some(1));
        assert_eq!(doc.index_of(doc.id()), None);
    }

    #[test]
    fn test_insert_clamps_index() {
        let mut doc = Document::new(None, "a");
        doc.insert(99, [Block::paragraph("z")]);
        doc.insert(0, vec![Block::paragraph("x"), Block::paragraph("y")]);
        assert_eq!(texts(&doc), vec!["x", "y", "a", "z"]);
    }

    #[test]
    fn test_insert_after_missing_is_noop() {
        let mut doc = Document::new(None, "a\nb");
        let before = doc.clone();
        let result = doc.insert_after(&NodeId::from("gone"), [Block::paragraph("x")]);
        assert!(matches!(result, Err(EditError::NodeNotFound(_))));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_insert_after() {
        let mut doc = Document::new(None, "a\nb");
        let a = doc.blocks()[0].id().clone();
        doc.insert_after(&a, [Block::paragraph("x")]).unwrap();
        assert_eq!(texts(&doc), vec!["a", "x", "b"]);
    }

    #[test]
    fn test_replace_preserves_id_across_type_change() {
        let mut doc = Document::new(None, "body");
        let id = doc.blocks()[0].id().clone();

        doc.replace(&id, Block::heading("Now a heading", HeadingLevel::H2))
            .unwrap();

        let block = doc.block(&id).unwrap();
        assert_eq!(block.node_type(), NodeType::Heading);
        assert_eq!(block.to_plain(), "Now a heading");
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut doc = Document::new(None, "a\nb");
        let a = doc.blocks()[0].id().clone();
        assert_eq!(doc.remove(&a).unwrap().to_plain(), "a");
        assert!(doc.remove(&a).is_err());
        assert_eq!(texts(&doc), vec!["b"]);
    }
}
