//! Role-specific property editing.
//!
//! Images expose `src`/`alt`/`width`/`height`; text and container
//! elements expose `content`/`font-size`/`color`/`font-weight`. Sizes
//! typed as bare numbers get a `px` suffix. Reads go through the
//! computed style chain so the panel shows what the element actually
//! renders with, not just its inline declarations.

use petgraph::graph::NodeIndex;
use poster_core::model::{Fragment, Role};
use poster_core::style::{StyleSheet, computed_value, ensure_px};
use serde::{Deserialize, Serialize};

/// Property values for the selected element, keyed by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertySheet {
    Image {
        src: String,
        alt: String,
        width: String,
        height: String,
    },
    Text {
        content: String,
        font_size: String,
        color: String,
        font_weight: String,
    },
    /// Unclassified elements expose nothing editable.
    Empty,
}

/// Apply one property edit. Returns whether the element changed; the
/// caller commits history on `true`. Unknown keys and keys that do not
/// belong to the element's role change nothing.
pub fn apply_property(fragment: &mut Fragment, ix: NodeIndex, key: &str, value: &str) -> bool {
    let Some(role) = fragment.element(ix).map(|el| el.role()) else {
        return false;
    };

    // Text replacement rewrites the subtree, not the element itself
    if key == "content" && matches!(role, Role::Text | Role::Container) {
        fragment.set_text_content(ix, value);
        return true;
    }

    let Some(el) = fragment.element_mut(ix) else {
        return false;
    };
    match (role, key) {
        (Role::Image, "src" | "alt") => el.set_attr(key, value),
        (Role::Image, "width" | "height") => {
            let px = ensure_px(value);
            el.style.set(key, &px);
        }
        (Role::Text | Role::Container, "font-size") => {
            let px = ensure_px(value);
            el.style.set("font-size", &px);
        }
        (Role::Text | Role::Container, "color" | "font-weight") => el.style.set(key, value),
        _ => return false,
    }
    true
}

/// Read the property values the panel shows for an element.
#[must_use]
pub fn read_properties(fragment: &Fragment, sheet: &StyleSheet, ix: NodeIndex) -> PropertySheet {
    let Some(el) = fragment.element(ix) else {
        return PropertySheet::Empty;
    };
    match el.role() {
        Role::Image => PropertySheet::Image {
            src: el.attr("src").unwrap_or_default().to_string(),
            alt: el.attr("alt").unwrap_or_default().to_string(),
            width: el
                .style
                .get("width")
                .or_else(|| el.attr("width"))
                .unwrap_or_default()
                .to_string(),
            height: el
                .style
                .get("height")
                .or_else(|| el.attr("height"))
                .unwrap_or_default()
                .to_string(),
        },
        Role::Text | Role::Container => PropertySheet::Text {
            content: fragment.text_content(ix),
            font_size: computed_value(fragment, sheet, ix, "font-size"),
            color: computed_value(fragment, sheet, ix, "color"),
            font_weight: computed_value(fragment, sheet, ix, "font-weight"),
        },
        Role::Other => PropertySheet::Empty,
    }
}
