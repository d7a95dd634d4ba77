//! Untrusted-markup sanitizer.
//!
//! Parses raw text with the permissive tree builder, prunes the DOM in
//! place, and re-serializes. Dangerous elements go away with their
//! content; harmless unknown elements are unwrapped so their children
//! survive; event-handler attributes and script-scheme URLs are
//! stripped. Sanitization always succeeds: bad input degrades to safe
//! output, it never raises.

use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::TendrilSink as _;
use html5ever::{Attribute, ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::cell::RefCell;

/// Tags that survive sanitization.
const ALLOWED_TAGS: &[&str] = &[
    "html", "head", "body", "title", "meta", "style", "div", "section", "article", "header",
    "footer", "main", "nav", "aside", "p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "strong",
    "em", "b", "i", "u", "a", "img", "figure", "figcaption", "blockquote", "pre", "code", "ul",
    "ol", "li", "br", "hr", "table", "thead", "tbody", "tr", "td", "th",
];

/// Tags removed together with everything inside them.
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "iframe", "object", "embed", "noscript", "template", "svg", "math", "audio",
    "video", "input", "link", "base",
];

/// Sanitize raw markup text. The output is a complete document as
/// corrected by the tree builder, with unsafe constructs removed and
/// structural/styling attributes preserved.
#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    sanitize_children(&dom.document);

    let mut bytes = Vec::new();
    let handle: SerializableHandle = dom.document.clone().into();
    if serialize(&mut bytes, &handle, SerializeOpts::default()).is_err() {
        return String::new();
    }
    String::from_utf8(bytes).unwrap_or_default()
}

fn sanitize_children(handle: &Handle) {
    let old: Vec<Handle> = std::mem::take(&mut *handle.children.borrow_mut());
    let mut kept: Vec<Handle> = Vec::new();
    for child in old {
        match &child.data {
            NodeData::Element { name, attrs, .. } => {
                let tag = name.local.to_string();
                if DROP_WITH_CONTENT.contains(&tag.as_str()) {
                    continue;
                }
                if ALLOWED_TAGS.contains(&tag.as_str()) {
                    sanitize_attrs(attrs);
                    sanitize_children(&child);
                    kept.push(child);
                } else {
                    // Unwrap: the element goes away, its children stay
                    sanitize_children(&child);
                    kept.append(&mut child.children.borrow_mut());
                }
            }
            NodeData::Text { .. } | NodeData::Doctype { .. } => kept.push(child),
            _ => {
                // Comments and processing instructions are dropped
            }
        }
    }
    *handle.children.borrow_mut() = kept;
}

fn sanitize_attrs(attrs: &RefCell<Vec<Attribute>>) {
    attrs.borrow_mut().retain(|attr| {
        let name = attr.name.local.to_string();
        if name.starts_with("on") {
            return false;
        }
        if matches!(name.as_str(), "href" | "src") && is_dangerous_url(&attr.value) {
            return false;
        }
        true
    });
}

/// Scheme check resistant to case tricks and embedded control characters.
fn is_dangerous_url(value: &str) -> bool {
    let v: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    v.starts_with("javascript:") || v.starts_with("vbscript:") || v.starts_with("data:text/html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_vanish_with_their_content() {
        let out = sanitize_html("<p>keep</p><script>alert('x')</script>");
        assert!(out.contains("<p>keep</p>"));
        assert!(!out.contains("script"));
        assert!(!out.contains("alert"));
    }

    #[test]
    fn iframes_and_embeds_are_removed() {
        let out = sanitize_html("<div><iframe src=\"https://evil\"></iframe><embed></div>");
        assert!(out.contains("<div>"));
        assert!(!out.contains("iframe"));
        assert!(!out.contains("embed"));
    }

    #[test]
    fn event_handlers_are_stripped() {
        let out = sanitize_html("<p onclick=\"steal()\" class=\"note\">x</p>");
        assert!(!out.contains("onclick"));
        assert!(out.contains("class=\"note\""));
    }

    #[test]
    fn script_scheme_urls_are_stripped() {
        let out = sanitize_html("<a href=\"javascript:alert(1)\">x</a>");
        assert!(!out.contains("javascript:"));
        let out = sanitize_html("<a href=\"https://example.com\">x</a>");
        assert!(out.contains("href=\"https://example.com\""));
    }

    #[test]
    fn obfuscated_schemes_are_caught() {
        assert!(is_dangerous_url("JaVaScRiPt:alert(1)"));
        assert!(is_dangerous_url("  java\nscript:alert(1)"));
        assert!(is_dangerous_url("data:text/html,<script>"));
        assert!(!is_dangerous_url("https://example.com/a.png"));
        assert!(!is_dangerous_url("data:image/png;base64,AAAA"));
    }

    #[test]
    fn unknown_elements_unwrap_keeping_children() {
        let out = sanitize_html("<custom-card><p>inside</p></custom-card>");
        assert!(!out.contains("custom-card"));
        assert!(out.contains("<p>inside</p>"));
    }

    #[test]
    fn styling_survives() {
        let out = sanitize_html(
            "<style>.poster { background: #f3f4f6 }</style>\
             <div class=\"poster\" style=\"width: 720px\" data-element-id=\"element-0\">x</div>",
        );
        assert!(out.contains(".poster { background: #f3f4f6 }"));
        assert!(out.contains("style=\"width: 720px\""));
        assert!(out.contains("data-element-id=\"element-0\""));
    }

    #[test]
    fn comments_are_dropped() {
        let out = sanitize_html("<p>x</p><!-- secret -->");
        assert!(!out.contains("secret"));
    }

    #[test]
    fn empty_input_yields_a_bare_document() {
        let out = sanitize_html("");
        assert!(out.contains("<html>"));
    }
}
