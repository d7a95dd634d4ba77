//! Emitter: [`Fragment`] → markup text.
//!
//! Produces compact, deterministic output that round-trips through the
//! parser. Attribute position is normalized: the identifier attribute
//! comes first, source attributes keep their document order, and
//! `style` is reassembled last. History snapshots and the export body
//! both go through here, so re-serializing a freshly parsed emission is
//! byte-identical.

use crate::model::{ELEMENT_ID_ATTR, Element, Fragment, Node};
use petgraph::graph::NodeIndex;

/// Emit the fragment's contents as markup text.
#[must_use]
pub fn serialize_fragment(fragment: &Fragment) -> String {
    let mut out = String::with_capacity(1024);
    for child in fragment.children(fragment.root) {
        emit_node(&mut out, fragment, child);
    }
    out
}

fn emit_node(out: &mut String, fragment: &Fragment, idx: NodeIndex) {
    match fragment.node(idx) {
        Some(Node::Element(el)) => emit_element(out, fragment, idx, el),
        Some(Node::Text(text)) => escape_text(out, text),
        _ => {}
    }
}

fn emit_element(out: &mut String, fragment: &Fragment, idx: NodeIndex, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);
    if let Some(id) = el.id {
        out.push(' ');
        out.push_str(ELEMENT_ID_ATTR);
        out.push_str("=\"");
        escape_attr(out, id.as_str());
        out.push('"');
    }
    for attr in &el.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        escape_attr(out, &attr.value);
        out.push('"');
    }
    if !el.style.is_empty() {
        out.push_str(" style=\"");
        escape_attr(out, &el.style.to_css());
        out.push('"');
    }
    out.push('>');

    if is_void(&el.tag) {
        return;
    }
    if is_raw_text(&el.tag) {
        // Raw text elements carry their content unescaped
        for child in fragment.children(idx) {
            if let Some(Node::Text(t)) = fragment.node(child) {
                out.push_str(t);
            }
        }
    } else {
        for child in fragment.children(idx) {
            emit_node(out, fragment, child);
        }
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "img" | "br" | "hr" | "meta" | "area" | "base" | "col" | "embed" | "input" | "link"
            | "source" | "track" | "wbr"
    )
}

fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "style" | "script")
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
