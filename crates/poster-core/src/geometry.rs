//! Geometry resolution and hit testing.
//!
//! Computes canvas-relative bounding boxes for every element from the
//! cascade (`left`/`top`/`width`/`height`), with per-role fallbacks:
//! images fall back to their size attributes and then 150×150, text
//! gets a font-size-scaled estimate, containers without a declared size
//! take the union of their children. Hit testing reverse-walks the tree
//! front-to-back.

use crate::id::ElementId;
use crate::model::{Fragment, Role};
use crate::style::{StyleSheet, computed_value, parse_px};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fallback square size for images with no declared dimensions.
pub const DEFAULT_IMAGE_SIZE: f32 = 150.0;

/// The fixed-size editing surface. One canvas per session, not
/// resizable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 720.0,
            height: 720.0,
        }
    }
}

/// Resolved canvas-relative bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    #[must_use]
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// Smallest box covering both.
    #[must_use]
    pub fn union(&self, other: Bounds) -> Bounds {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        Bounds {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

/// Resolve canvas-relative bounds for every element of the fragment.
#[must_use]
pub fn resolve_geometry(fragment: &Fragment, sheet: &StyleSheet) -> HashMap<NodeIndex, Bounds> {
    let mut bounds = HashMap::new();
    for child in fragment.children(fragment.root) {
        resolve_node(fragment, sheet, child, 0.0, 0.0, &mut bounds);
    }
    bounds
}

fn resolve_node(
    fragment: &Fragment,
    sheet: &StyleSheet,
    ix: NodeIndex,
    origin_x: f32,
    origin_y: f32,
    out: &mut HashMap<NodeIndex, Bounds>,
) -> Option<Bounds> {
    let el = fragment.element(ix)?;
    let left = parse_px(&computed_value(fragment, sheet, ix, "left")).unwrap_or(0.0);
    let top = parse_px(&computed_value(fragment, sheet, ix, "top")).unwrap_or(0.0);
    let x = origin_x + left;
    let y = origin_y + top;

    let declared_w = parse_px(&computed_value(fragment, sheet, ix, "width"));
    let declared_h = parse_px(&computed_value(fragment, sheet, ix, "height"));

    // Children lay out against this element's origin
    let mut union: Option<Bounds> = None;
    for child in fragment.children(ix) {
        if let Some(cb) = resolve_node(fragment, sheet, child, x, y, out) {
            union = Some(match union {
                None => cb,
                Some(u) => u.union(cb),
            });
        }
    }

    let (width, height) = match el.role() {
        Role::Image => (
            declared_w
                .or_else(|| el.attr("width").and_then(parse_px))
                .unwrap_or(DEFAULT_IMAGE_SIZE),
            declared_h
                .or_else(|| el.attr("height").and_then(parse_px))
                .unwrap_or(DEFAULT_IMAGE_SIZE),
        ),
        Role::Text => {
            let font = parse_px(&computed_value(fragment, sheet, ix, "font-size")).unwrap_or(16.0);
            let chars = fragment.text_content(ix).chars().count().max(1) as f32;
            (
                declared_w.unwrap_or(chars * font * 0.5),
                declared_h.unwrap_or(font * 1.25),
            )
        }
        _ => {
            let far_x = union.map_or(0.0, |u| (u.x + u.width - x).max(0.0));
            let far_y = union.map_or(0.0, |u| (u.y + u.height - y).max(0.0));
            (declared_w.unwrap_or(far_x), declared_h.unwrap_or(far_y))
        }
    };

    let b = Bounds {
        x,
        y,
        width,
        height,
    };
    out.insert(ix, b);
    Some(b)
}

/// Find the topmost identified element at position (px, py).
/// Returns `None` for the canvas background.
#[must_use]
pub fn hit_test(
    fragment: &Fragment,
    bounds: &HashMap<NodeIndex, Bounds>,
    px: f32,
    py: f32,
) -> Option<ElementId> {
    hit_test_node(fragment, fragment.root, bounds, px, py)
}

fn hit_test_node(
    fragment: &Fragment,
    idx: NodeIndex,
    bounds: &HashMap<NodeIndex, Bounds>,
    px: f32,
    py: f32,
) -> Option<ElementId> {
    // Check children in reverse (last painted = topmost)
    for child_idx in fragment.children(idx).into_iter().rev() {
        if let Some(hit) = hit_test_node(fragment, child_idx, bounds, px, py) {
            return Some(hit);
        }
    }

    if let Some(b) = bounds.get(&idx)
        && b.contains(px, py)
        && let Some(id) = fragment.element(idx).and_then(|el| el.id)
    {
        return Some(id);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdAllocator;
    use crate::parser::parse_fragment_html;

    fn resolved(html: &str, css: &str) -> (Fragment, HashMap<NodeIndex, Bounds>) {
        let mut fragment = parse_fragment_html(html);
        let mut alloc = IdAllocator::new();
        fragment.assign_ids(&mut alloc);
        let sheet = StyleSheet::parse(css);
        let bounds = resolve_geometry(&fragment, &sheet);
        (fragment, bounds)
    }

    fn bounds_of(fragment: &Fragment, bounds: &HashMap<NodeIndex, Bounds>, id: &str) -> Bounds {
        let ix = fragment.index_of(ElementId::intern(id)).unwrap();
        bounds[&ix]
    }

    #[test]
    fn default_canvas_is_square() {
        let canvas = Canvas::default();
        assert_eq!(canvas.width, 720.0);
        assert_eq!(canvas.height, 720.0);
    }

    #[test]
    fn images_fall_back_through_attrs_to_the_default() {
        let (f, b) = resolved(
            "<img data-element-id=\"a\" style=\"width: 300px; height: 200px\">\
             <img data-element-id=\"b\" width=\"380\" height=\"380\">\
             <img data-element-id=\"c\">",
            "",
        );
        assert_eq!(bounds_of(&f, &b, "a").width, 300.0);
        assert_eq!(bounds_of(&f, &b, "a").height, 200.0);
        assert_eq!(bounds_of(&f, &b, "b").width, 380.0);
        assert_eq!(bounds_of(&f, &b, "c").width, DEFAULT_IMAGE_SIZE);
        assert_eq!(bounds_of(&f, &b, "c").height, DEFAULT_IMAGE_SIZE);
    }

    #[test]
    fn text_estimate_scales_with_font_size() {
        let (f, b) = resolved(
            "<p data-element-id=\"small\">Hello</p>\
             <h1 data-element-id=\"big\">Hello</h1>",
            "",
        );
        let small = bounds_of(&f, &b, "small");
        let big = bounds_of(&f, &b, "big");
        // 5 chars at 16px vs the 32px heading default
        assert_eq!(small.width, 5.0 * 16.0 * 0.5);
        assert_eq!(big.width, 5.0 * 32.0 * 0.5);
        assert_eq!(small.height, 20.0);
        assert_eq!(big.height, 40.0);
    }

    #[test]
    fn offsets_accumulate_from_parents() {
        let (f, b) = resolved(
            "<div data-element-id=\"outer\" style=\"left: 40px; top: 80px; width: 400px; height: 400px\">\
             <p data-element-id=\"inner\" style=\"left: 10px; top: 20px\">x</p>\
             </div>",
            "",
        );
        let inner = bounds_of(&f, &b, "inner");
        assert_eq!(inner.x, 50.0);
        assert_eq!(inner.y, 100.0);
    }

    #[test]
    fn sheet_positions_participate() {
        let (f, b) = resolved(
            "<h1 data-element-id=\"t\" class=\"title\">Sale</h1>",
            ".title { left: 40px; top: 80px }",
        );
        let t = bounds_of(&f, &b, "t");
        assert_eq!(t.x, 40.0);
        assert_eq!(t.y, 80.0);
    }

    #[test]
    fn containers_union_their_children() {
        let (f, b) = resolved(
            "<div data-element-id=\"box\">\
             <img data-element-id=\"i\" style=\"left: 100px; top: 50px\" width=\"200\" height=\"100\">\
             </div>",
            "",
        );
        let box_b = bounds_of(&f, &b, "box");
        assert_eq!(box_b.width, 300.0, "far child edge sets the union width");
        assert_eq!(box_b.height, 150.0);
    }

    #[test]
    fn hit_test_picks_the_topmost_sibling() {
        let (f, b) = resolved(
            "<img data-element-id=\"under\" style=\"left: 0px; top: 0px\" width=\"200\" height=\"200\">\
             <img data-element-id=\"over\" style=\"left: 100px; top: 100px\" width=\"200\" height=\"200\">",
            "",
        );
        // Overlap region: the later sibling wins
        assert_eq!(
            hit_test(&f, &b, 150.0, 150.0),
            Some(ElementId::intern("over"))
        );
        assert_eq!(
            hit_test(&f, &b, 50.0, 50.0),
            Some(ElementId::intern("under"))
        );
        assert_eq!(hit_test(&f, &b, 500.0, 500.0), None);
    }

    #[test]
    fn hit_test_prefers_children_over_their_container() {
        let (f, b) = resolved(
            "<div data-element-id=\"poster\" style=\"width: 720px; height: 720px\">\
             <img data-element-id=\"hero\" style=\"left: 300px; top: 300px\" width=\"100\" height=\"100\">\
             </div>",
            "",
        );
        assert_eq!(
            hit_test(&f, &b, 350.0, 350.0),
            Some(ElementId::intern("hero"))
        );
        assert_eq!(
            hit_test(&f, &b, 10.0, 10.0),
            Some(ElementId::intern("poster"))
        );
    }
}
