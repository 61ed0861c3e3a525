use crate::models::{Block, Document, Image, WriteMode};
use crate::visual::{
    ATTR_ALT, ATTR_DISPLAY, ATTR_HEIGHT, ATTR_LEVEL, ATTR_MODE, ATTR_NODE_ID, ATTR_SRC, ATTR_TYPE,
    ATTR_WIDTH, Element, VisualNode,
};

/// Render a document into a tagged visual tree
pub fn render(doc: &Document) -> VisualNode {
    let layout = match doc.mode {
        WriteMode::Ltr => "column",
        WriteMode::Ttb => "row",
    };

    Element::new("div")
        .with_attr(ATTR_TYPE, "document")
        .with_attr(ATTR_NODE_ID, doc.id().as_str())
        .with_attr(ATTR_MODE, doc.mode.as_str())
        .with_attr("class", layout)
        .with_children(doc.blocks().iter().map(render_block))
        .into()
}

pub fn render_block(block: &Block) -> VisualNode {
    let el = match block {
        Block::Heading(h) => Element::new(format!("h{}", h.level.get()))
            .with_attr(ATTR_LEVEL, h.level.get().to_string())
            .with_child(text_or_placeholder(&h.text)),
        Block::Paragraph(p) => Element::new("p").with_child(text_or_placeholder(&p.text)),
        Block::Image(img) => render_image(img),
    };

    el.with_attr(ATTR_TYPE, block.node_type().as_str())
        .with_attr(ATTR_NODE_ID, block.id().as_str())
        .into()
}

/// Empty blocks get a line break so offset 0 is still addressable
fn text_or_placeholder(text: &str) -> VisualNode {
    if text.is_empty() {
        Element::new("br").into()
    } else {
        VisualNode::text(text)
    }
}

fn render_image(img: &Image) -> Element {
    let mut el = Element::new("img")
        .with_attr("src", img.src.as_str())
        .with_attr(ATTR_SRC, img.src.as_str());

    if let Some(alt) = &img.alt {
        el = el.with_attr("alt", alt.as_str()).with_attr(ATTR_ALT, alt.as_str());
    }
    if let Some(display) = img.display {
        el = el.with_attr(ATTR_DISPLAY, display.as_str());
    }
    if let Some(width) = img.width {
        el = el.with_attr(ATTR_WIDTH, width.to_string());
    }
    if let Some(height) = img.height {
        el = el.with_attr(ATTR_HEIGHT, height.to_string());
    }
    el
}
