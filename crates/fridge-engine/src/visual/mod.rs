/*!
 * # Visual Tree
 *
 * The editable surface is modelled as a small element/text tree, the same shape
 * a browser DOM or any retained-mode text view exposes. The engine never keeps
 * references into it: every call re-derives what it needs from the root.
 *
 * ## Tagging convention
 *
 * Every addressable element carries two attributes that tie it back to the
 * document tree:
 *
 * - `data-type`: one of `document`, `heading`, `paragraph`, `image`
 * - `data-node-id`: the id of the node it was rendered from
 *
 * Headings add `data-level`, the document root adds `data-mode`, images carry
 * their payload as `data-src`, `data-alt`, `data-display`, `data-width` and
 * `data-height`. Both [`reconstruct`] and the selection mapper rely on these
 * tags, so anything that rewrites the tree must keep them intact.
 */

use std::collections::BTreeMap;

use crate::models::{NodeId, NodeType};
use crate::text::utf16_len;

pub mod html;
pub mod reconstruct;
pub mod render;

pub use reconstruct::reconstruct;
pub use render::{render, render_block};

pub const ATTR_TYPE: &str = "data-type";
pub const ATTR_NODE_ID: &str = "data-node-id";
pub const ATTR_LEVEL: &str = "data-level";
pub const ATTR_MODE: &str = "data-mode";
pub const ATTR_SRC: &str = "data-src";
pub const ATTR_ALT: &str = "data-alt";
pub const ATTR_DISPLAY: &str = "data-display";
pub const ATTR_WIDTH: &str = "data-width";
pub const ATTR_HEIGHT: &str = "data-height";

/// Tags rendered as void elements (no children, no closing tag)
pub(crate) const VOID_TAGS: &[&str] = &["br", "img"];

/// Address of a node: child indices from the root. The root itself is `[]`.
pub type NodePath = Vec<usize>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<VisualNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: VisualNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = VisualNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Raw `data-type` value
    pub fn type_tag(&self) -> Option<&str> {
        self.attr(ATTR_TYPE)
    }

    /// Parsed `data-type`; `None` when missing or unrecognized
    pub fn node_type(&self) -> Option<NodeType> {
        self.type_tag()?.parse().ok()
    }

    /// `data-node-id`, ignoring empty values
    pub fn node_id(&self) -> Option<NodeId> {
        self.attr(ATTR_NODE_ID)
            .filter(|id| !id.is_empty())
            .map(NodeId::from)
    }

    /// Concatenated text of all descendant text nodes in document order
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VisualNode {
    Element(Element),
    Text(String),
}

impl VisualNode {
    pub fn text(text: impl Into<String>) -> Self {
        VisualNode::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            VisualNode::Element(el) => Some(el),
            VisualNode::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            VisualNode::Element(el) => Some(el),
            VisualNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[VisualNode] {
        match self {
            VisualNode::Element(el) => &el.children,
            VisualNode::Text(_) => &[],
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            VisualNode::Text(text) => out.push_str(text),
            VisualNode::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }

    pub fn get(&self, path: &[usize]) -> Option<&VisualNode> {
        let mut node = self;
        for &index in path {
            node = node.children().get(index)?;
        }
        Some(node)
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut VisualNode> {
        let mut node = self;
        for &index in path {
            node = node.as_element_mut()?.children.get_mut(index)?;
        }
        Some(node)
    }

    /// Path of the first element (depth-first) tagged with `id`
    pub fn find_by_node_id(&self, id: &NodeId) -> Option<NodePath> {
        let mut path = Vec::new();
        if self.find_by_node_id_inner(id, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn find_by_node_id_inner(&self, id: &NodeId, path: &mut NodePath) -> bool {
        let VisualNode::Element(el) = self else {
            return false;
        };
        if el.attr(ATTR_NODE_ID) == Some(id.as_str()) {
            return true;
        }
        for (index, child) in el.children.iter().enumerate() {
            path.push(index);
            if child.find_by_node_id_inner(id, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// Every text node under this node in document order, with its path
    /// (relative to this node) and UTF-16 length
    pub fn text_nodes(&self) -> Vec<(NodePath, usize)> {
        let mut out = Vec::new();
        self.collect_text_nodes(&mut Vec::new(), &mut out);
        out
    }

    fn collect_text_nodes(&self, path: &mut NodePath, out: &mut Vec<(NodePath, usize)>) {
        match self {
            VisualNode::Text(text) => out.push((path.clone(), utf16_len(text))),
            VisualNode::Element(el) => {
                for (index, child) in el.children.iter().enumerate() {
                    path.push(index);
                    child.collect_text_nodes(path, out);
                    path.pop();
                }
            }
        }
    }
}

impl From<Element> for VisualNode {
    fn from(el: Element) -> Self {
        VisualNode::Element(el)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VisualNode {
        Element::new("div")
            .with_attr(ATTR_TYPE, "document")
            .with_child(
                Element::new("p")
                    .with_attr(ATTR_TYPE, "paragraph")
                    .with_attr(ATTR_NODE_ID, "p1")
                    .with_child(VisualNode::text("ab"))
                    .with_child(Element::new("span").with_child(VisualNode::text("見")).into())
                    .into(),
            )
            .with_child(
                Element::new("p")
                    .with_attr(ATTR_TYPE, "paragraph")
                    .with_attr(ATTR_NODE_ID, "p2")
                    .into(),
            )
            .into()
    }

    #[test]
    fn test_get_by_path() {
        let root = sample();
        assert_eq!(root.get(&[0, 1, 0]), Some(&VisualNode::text("見")));
        assert!(root.get(&[0, 5]).is_none());
        assert!(root.get(&[0, 0, 0]).is_none());
    }

    #[test]
    fn test_find_by_node_id() {
        let root = sample();
        assert_eq!(root.find_by_node_id(&NodeId::from("p2")), Some(vec![1]));
        assert_eq!(root.find_by_node_id(&NodeId::from("nope")), None);
    }

    #[test]
    fn test_text_nodes_in_order() {
        let root = sample();
        assert_eq!(root.text_nodes(), vec![(vec![0, 0], 2), (vec![0, 1, 0], 1)]);
        assert_eq!(root.text_content(), "ab見");
    }

    #[test]
    fn test_empty_node_id_is_ignored() {
        let el = Element::new("p").with_attr(ATTR_NODE_ID, "");
        assert!(el.node_id().is_none());
    }
}
