//! HTML serialization of a visual tree, for hosts that render markup directly.

use crate::visual::{Element, VOID_TAGS, VisualNode};

impl VisualNode {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

impl Element {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

fn write_node(node: &VisualNode, out: &mut String) {
    match node {
        VisualNode::Text(text) => out.push_str(&html_escape::encode_text(text)),
        VisualNode::Element(el) => write_element(el, out),
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }

    if VOID_TAGS.contains(&el.tag.as_str()) {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in &el.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}
