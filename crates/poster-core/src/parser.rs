//! HTML → [`Fragment`] parser, built on `html5ever`.
//!
//! The tree builder is permissive: malformed markup is corrected during
//! construction and there is no parse-failure state. For full documents
//! the body's children become the fragment and `<style>` text from head
//! and body is collected separately; snapshot text is re-parsed in body
//! context so nothing gets hoisted into a synthetic head.

use crate::id::ElementId;
use crate::model::{Attr, ELEMENT_ID_ATTR, Element, Fragment, Node};
use crate::style::StyleMap;
use html5ever::tendril::TendrilSink as _;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use petgraph::graph::NodeIndex;

/// A parsed document: the renderable body fragment plus the style text
/// collected from every `<style>` element, in document order.
#[derive(Debug, Default)]
pub struct Document {
    pub fragment: Fragment,
    pub styles: String,
}

fn parse_opts() -> ParseOpts {
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: false,
            ..TreeBuilderOpts::default()
        },
        ..ParseOpts::default()
    }
}

/// Parse a complete HTML document.
#[must_use]
pub fn parse_document_html(html: &str) -> Document {
    let dom = parse_document(RcDom::default(), parse_opts()).one(html);

    let mut doc = Document::default();
    collect_styles(&dom.document, &mut doc.styles);

    let root = doc.fragment.root;
    if let Some(body) = find_body(&dom.document) {
        for child in body.children.borrow().iter() {
            build_node(child, root, &mut doc.fragment);
        }
    }
    doc
}

/// Parse markup in body context, for restoring history snapshots.
/// Unlike bare-document parsing, a leading `<style>` stays where it was
/// written instead of migrating into an implied head.
#[must_use]
pub fn parse_fragment_html(html: &str) -> Fragment {
    // The explicit <body> closes the implied head before any content,
    // so nothing gets hoisted out of the fragment
    let wrapped = format!("<html><body>{html}</body></html>");
    let dom = parse_document(RcDom::default(), parse_opts()).one(wrapped.as_str());

    let mut fragment = Fragment::new();
    let root = fragment.root;
    if let Some(body) = find_body(&dom.document) {
        for child in body.children.borrow().iter() {
            build_node(child, root, &mut fragment);
        }
    }
    fragment
}

// ─── DOM walk ───────────────────────────────────────────────────────────

fn build_node(handle: &Handle, parent: NodeIndex, fragment: &mut Fragment) {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut element = Element::new(&name.local.to_string());
            for attr in attrs.borrow().iter() {
                let attr_name = attr.name.local.to_string();
                let value = attr.value.to_string();
                match attr_name.as_str() {
                    "style" => element.style = StyleMap::parse(&value),
                    ELEMENT_ID_ATTR => element.id = Some(ElementId::intern(&value)),
                    _ => element.attrs.push(Attr {
                        name: attr_name,
                        value,
                    }),
                }
            }
            let ix = fragment.append_child(parent, Node::Element(element));
            for child in handle.children.borrow().iter() {
                build_node(child, ix, fragment);
            }
        }
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            // Inter-element formatting whitespace is dropped; runs with
            // visible content keep their original spacing
            if !text.trim().is_empty() {
                fragment.append_child(parent, Node::Text(text));
            }
        }
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                build_node(child, parent, fragment);
            }
        }
        _ => {
            // Comments, doctypes and processing instructions are dropped
        }
    }
}

fn element_tag(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn child_element(handle: &Handle, tag: &str) -> Option<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .find(|c| element_tag(c).as_deref() == Some(tag))
        .cloned()
}

fn find_body(document: &Handle) -> Option<Handle> {
    let html = child_element(document, "html")?;
    child_element(&html, "body")
}

/// Gather trimmed `<style>` text across the whole DOM, joined by newlines.
fn collect_styles(handle: &Handle, out: &mut String) {
    if element_tag(handle).as_deref() == Some("style") {
        let text = text_of(handle);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(trimmed);
        }
        return;
    }
    for child in handle.children.borrow().iter() {
        collect_styles(child, out);
    }
}

fn text_of(handle: &Handle) -> String {
    let mut out = String::new();
    for child in handle.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            out.push_str(&contents.borrow());
        }
    }
    out
}
