use crate::editing::EditError;
use crate::models::{Block, Document, Heading, HeadingLevel, Image, NodeId, NodeType, Paragraph};
use crate::text::normalize_newlines;
use crate::visual::{
    ATTR_ALT, ATTR_DISPLAY, ATTR_HEIGHT, ATTR_LEVEL, ATTR_MODE, ATTR_SRC, ATTR_WIDTH, Element,
    VisualNode,
};

/// Rebuild a document from a tagged visual tree.
///
/// Only direct children of the root are read, one block per element. Elements
/// without a recognized type tag are skipped. Node-id tags win over fresh ids,
/// so a tree produced by [`render`](crate::visual::render) reconstructs to the
/// same ids in the same order.
///
/// Fails with [`EditError::NotADocument`] when the root itself is not tagged
/// `document`; that means "nothing to apply", never "empty document".
pub fn reconstruct(root: &VisualNode) -> Result<Document, EditError> {
    let Some(root_el) = root
        .as_element()
        .filter(|el| el.node_type() == Some(NodeType::Document))
    else {
        log::warn!("reconstruct: root is not tagged as a document");
        return Err(EditError::NotADocument);
    };

    let blocks = root_el
        .children
        .iter()
        .filter_map(|child| match child {
            VisualNode::Element(el) => reconstruct_block(el),
            VisualNode::Text(_) => None,
        })
        .collect();

    let id = root_el.node_id().unwrap_or_default();
    let mode = root_el
        .attr(ATTR_MODE)
        .and_then(|m| m.parse().ok())
        .unwrap_or_default();

    Ok(Document::from_parts(id, mode, blocks))
}

fn reconstruct_block(el: &Element) -> Option<Block> {
    let Some(tag) = el.type_tag() else {
        log::debug!("reconstruct: skipping untagged <{}>", el.tag);
        return None;
    };
    let id = el.node_id().unwrap_or_else(NodeId::new);

    match tag.parse::<NodeType>() {
        Ok(NodeType::Heading) => {
            let level = el
                .attr(ATTR_LEVEL)
                .and_then(|l| l.parse::<u8>().ok())
                .and_then(|l| HeadingLevel::try_from(l).ok())
                .unwrap_or_default();
            Some(Block::Heading(Heading {
                id,
                text: block_text(el),
                level,
            }))
        }
        Ok(NodeType::Paragraph) => Some(Block::Paragraph(Paragraph {
            id,
            text: block_text(el),
        })),
        Ok(NodeType::Image) => {
            let Some(src) = el.attr(ATTR_SRC) else {
                log::warn!("reconstruct: image {id} has no source, dropping it");
                return None;
            };
            Some(Block::Image(Image {
                id,
                src: src.to_string(),
                alt: el.attr(ATTR_ALT).map(str::to_string),
                display: el.attr(ATTR_DISPLAY).and_then(|d| d.parse().ok()),
                width: el.attr(ATTR_WIDTH).and_then(|w| w.parse().ok()),
                height: el.attr(ATTR_HEIGHT).and_then(|h| h.parse().ok()),
            }))
        }
        Ok(NodeType::Document) | Err(_) => {
            log::debug!("reconstruct: skipping element tagged {tag:?}");
            None
        }
    }
}

fn block_text(el: &Element) -> String {
    normalize_newlines(&el.text_content()).into_owned()
}
