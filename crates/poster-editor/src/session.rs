//! Editor session: the authoritative fragment plus everything editing
//! needs around it.
//!
//! One session owns the parsed fragment, the collected style text, the
//! resolved geometry, the selection/drag controller, and the history
//! log. Every entry point runs to completion, including its at most
//! one history commit, before the next event arrives; callers react to
//! the `EditorEvent`s each call returns.

use crate::history::HistoryLog;
use crate::input::{Modifiers, PointerButton};
use crate::properties::{self, PropertySheet};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::stage::StageController;
use petgraph::graph::NodeIndex;
use poster_core::emitter::serialize_fragment;
use poster_core::error::PosterResult;
use poster_core::export::{compose_document, image_data_url, read_html_file, write_html_file};
use poster_core::geometry::{Bounds, Canvas, hit_test, resolve_geometry};
use poster_core::id::{ElementId, IdAllocator};
use poster_core::model::{Element, Fragment, Node, Role};
use poster_core::parser::{parse_document_html, parse_fragment_html};
use poster_core::sanitize::sanitize_html;
use poster_core::style::{StyleSheet, format_px};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Starter fragment shown before any import.
const DEFAULT_POSTER_HTML: &str = r#"<div class="poster">
  <h1 class="title">Summer Sale</h1>
  <p class="subtitle">Up to <strong>50% off</strong> on select items!</p>
  <img class="hero" src="https://via.placeholder.com/380" alt="Model" />
</div>"#;

/// Style rules accompanying the starter fragment.
const DEFAULT_POSTER_STYLES: &str = r#"body { margin: 0; padding: 0; }
.poster {
  width: 720px;
  height: 720px;
  position: relative;
  background: #f3f4f6;
  overflow: hidden;
  font-family: sans-serif;
}
.title {
  position: absolute;
  top: 80px;
  left: 40px;
  font-size: 48px;
  font-weight: bold;
  color: #111827;
}
.subtitle {
  position: absolute;
  top: 160px;
  left: 40px;
  font-size: 20px;
  color: #374151;
}
.hero {
  position: absolute;
  bottom: 0;
  right: 0;
  width: 380px;
  height: 380px;
  object-fit: cover;
}"#;

/// What a session call changed, for the embedding surface to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EditorEvent {
    SelectionChanged(Option<ElementId>),
    /// Live drag position, canvas-relative top-left.
    PositionChanged { id: ElementId, x: f32, y: f32 },
    ElementAdded(ElementId),
    ElementRemoved(ElementId),
    EditingStarted(ElementId),
    EditingEnded(ElementId),
    /// The whole fragment was swapped out (import, undo, redo).
    FragmentReplaced,
}

/// The current selection with its resolved box, for the overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub id: ElementId,
    pub tag: String,
    pub role: Role,
    pub bounds: Bounds,
}

/// A single editing session over one poster document.
pub struct EditorSession {
    /// The current fragment (single source of truth).
    pub fragment: Fragment,
    /// Style text collected from the imported document, exported
    /// verbatim. Not versioned by history.
    pub styles: String,
    /// Resolved canvas-relative boxes, recomputed after mutations.
    pub bounds: HashMap<NodeIndex, Bounds>,
    /// Parsed form of `styles` for cascade lookups.
    sheet: StyleSheet,
    canvas: Canvas,
    alloc: IdAllocator,
    history: HistoryLog,
    stage: StageController,
}

impl EditorSession {
    #[must_use]
    pub fn new() -> Self {
        Self::with_canvas(Canvas::default())
    }

    #[must_use]
    pub fn with_canvas(canvas: Canvas) -> Self {
        Self {
            fragment: Fragment::new(),
            styles: String::new(),
            bounds: HashMap::new(),
            sheet: StyleSheet::default(),
            canvas,
            alloc: IdAllocator::new(),
            history: HistoryLog::new(),
            stage: StageController::new(canvas),
        }
    }

    #[must_use]
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Whether inline text editing is active (the overlay renders the
    /// element editable while this holds).
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.stage.is_editing()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.stage.is_dragging()
    }

    #[must_use]
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    // ─── Import ──────────────────────────────────────────────────────────

    /// Start from the built-in example poster.
    pub fn load_default(&mut self) -> Vec<EditorEvent> {
        let fragment = parse_fragment_html(DEFAULT_POSTER_HTML);
        self.replace_fragment(fragment, DEFAULT_POSTER_STYLES.to_string())
    }

    /// Import pasted or uploaded markup: sanitize, parse, split off the
    /// style text, tag every element, and commit the result.
    pub fn import_html(&mut self, html: &str) -> Vec<EditorEvent> {
        let clean = sanitize_html(html);
        let doc = parse_document_html(&clean);
        self.replace_fragment(doc.fragment, doc.styles)
    }

    /// Import a document from disk. A read error aborts with no state
    /// change.
    pub fn import_file(&mut self, path: &Path) -> PosterResult<Vec<EditorEvent>> {
        let text = read_html_file(path)?;
        Ok(self.import_html(&text))
    }

    fn replace_fragment(&mut self, fragment: Fragment, styles: String) -> Vec<EditorEvent> {
        self.fragment = fragment;
        self.styles = styles;
        self.sheet = StyleSheet::parse(&self.styles);
        self.fragment.assign_ids(&mut self.alloc);
        self.stage.clear();
        self.refresh_bounds();
        self.commit();
        log::debug!(
            "fragment replaced: {} nodes, {} identified",
            self.fragment.graph.node_count(),
            self.fragment.id_index.len()
        );
        vec![
            EditorEvent::FragmentReplaced,
            EditorEvent::SelectionChanged(None),
        ]
    }

    // ─── Pointer events ──────────────────────────────────────────────────

    /// Primary press: arms a drag when it lands on the selection, ends
    /// inline editing when it lands anywhere else.
    pub fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton) -> Vec<EditorEvent> {
        if button != PointerButton::Primary {
            return Vec::new();
        }
        let hit = hit_test(&self.fragment, &self.bounds, x, y);
        let mut events = Vec::new();
        if self.stage.is_editing() {
            if hit == self.stage.selection() {
                // Clicks inside the text being edited move the caret
                return events;
            }
            events.extend(self.end_inline_edit());
        }
        let hit_bounds = hit
            .and_then(|id| self.fragment.index_of(id))
            .and_then(|ix| self.bounds.get(&ix).copied());
        self.stage.press(hit.zip(hit_bounds), x, y);
        events
    }

    /// Pointer motion. While dragging, moves the selected element to
    /// the clamped position and reports it; no history commit.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Vec<EditorEvent> {
        let Some((id, nx, ny)) = self.stage.drag(x, y) else {
            return Vec::new();
        };
        let Some(ix) = self.fragment.index_of(id) else {
            return Vec::new();
        };
        self.apply_position(ix, nx, ny);
        if let Some(b) = self.bounds.get_mut(&ix) {
            b.x = nx;
            b.y = ny;
        }
        vec![EditorEvent::PositionChanged { id, x: nx, y: ny }]
    }

    /// Release: a drag commits exactly once (even if nothing moved);
    /// otherwise the click resolves the new selection.
    pub fn pointer_up(&mut self, x: f32, y: f32) -> Vec<EditorEvent> {
        let before = self.stage.selection();
        let hit = hit_test(&self.fragment, &self.bounds, x, y);
        if self.stage.release(hit).is_some() {
            self.refresh_bounds();
            self.commit();
        }
        let after = self.stage.selection();
        if after == before {
            Vec::new()
        } else {
            vec![EditorEvent::SelectionChanged(after)]
        }
    }

    /// The pointer left the canvas: ends an active drag like a release
    /// but keeps the selection.
    pub fn pointer_leave(&mut self) -> Vec<EditorEvent> {
        if self.stage.leave().is_some() {
            self.refresh_bounds();
            self.commit();
        }
        Vec::new()
    }

    /// Double-click: selects the target and begins inline text editing
    /// when its role allows it.
    pub fn double_click(&mut self, x: f32, y: f32) -> Vec<EditorEvent> {
        let hit = hit_test(&self.fragment, &self.bounds, x, y);
        let mut events = Vec::new();
        if self.stage.is_editing() {
            if hit == self.stage.selection() {
                return events;
            }
            events.extend(self.end_inline_edit());
        }
        let before = self.stage.selection();
        let editable = hit
            .and_then(|id| self.fragment.element_by_id(id))
            .is_some_and(|el| el.supports_inline_edit());
        let began = self.stage.double_click(hit, editable);
        let after = self.stage.selection();
        if after != before {
            events.push(EditorEvent::SelectionChanged(after));
        }
        if began && let Some(id) = hit {
            events.push(EditorEvent::EditingStarted(id));
        }
        events
    }

    // ─── Inline text editing ─────────────────────────────────────────────

    /// Live text input while inline editing. Mutates the element's text
    /// without committing; the commit lands when the edit ends.
    pub fn set_inline_text(&mut self, text: &str) {
        if self.stage.is_editing()
            && let Some(ix) = self.selected_index()
        {
            self.fragment.set_text_content(ix, text);
        }
    }

    /// Finish inline editing (the blur equivalent): one commit.
    pub fn end_inline_edit(&mut self) -> Vec<EditorEvent> {
        match self.stage.end_edit() {
            Some(id) => {
                self.refresh_bounds();
                self.commit();
                vec![EditorEvent::EditingEnded(id)]
            }
            None => Vec::new(),
        }
    }

    // ─── Element lifecycle ───────────────────────────────────────────────

    /// Append a starter paragraph to the fragment root.
    pub fn add_text(&mut self) -> Vec<EditorEvent> {
        let mut el = Element::new("p");
        el.style.set("position", "absolute");
        el.style.set("left", "50px");
        el.style.set("top", "50px");
        el.style.set("font-size", "16px");
        el.style.set("color", "#000000");
        let root = self.fragment.root;
        let ix = self.fragment.append_child(root, Node::Element(el));
        self.fragment
            .append_child(ix, Node::Text("New Text".to_string()));
        self.finish_insert(ix)
    }

    /// Append a placeholder image to the fragment root.
    pub fn add_image(&mut self) -> Vec<EditorEvent> {
        let mut el = Element::new("img");
        el.set_attr("src", "https://via.placeholder.com/150");
        el.set_attr("alt", "New Image");
        el.style.set("position", "absolute");
        el.style.set("left", "50px");
        el.style.set("top", "50px");
        el.style.set("width", "150px");
        el.style.set("height", "150px");
        let root = self.fragment.root;
        let ix = self.fragment.append_child(root, Node::Element(el));
        self.finish_insert(ix)
    }

    fn finish_insert(&mut self, ix: NodeIndex) -> Vec<EditorEvent> {
        self.fragment.assign_ids(&mut self.alloc);
        self.refresh_bounds();
        self.commit();
        match self.fragment.element(ix).and_then(|el| el.id) {
            Some(id) => vec![EditorEvent::ElementAdded(id)],
            None => Vec::new(),
        }
    }

    /// Remove the selected element and its subtree.
    pub fn delete_selection(&mut self) -> Vec<EditorEvent> {
        let Some(id) = self.stage.selection() else {
            return Vec::new();
        };
        let Some(ix) = self.fragment.index_of(id) else {
            return Vec::new();
        };
        self.fragment.remove_subtree(ix);
        self.stage.clear();
        self.refresh_bounds();
        self.commit();
        vec![
            EditorEvent::ElementRemoved(id),
            EditorEvent::SelectionChanged(None),
        ]
    }

    // ─── Properties ──────────────────────────────────────────────────────

    /// Apply a property edit to the selection. A successful edit
    /// commits exactly once; unknown keys and a missing selection
    /// change nothing.
    pub fn apply_property(&mut self, key: &str, value: &str) -> bool {
        let Some(ix) = self.selected_index() else {
            return false;
        };
        if !properties::apply_property(&mut self.fragment, ix, key, value) {
            return false;
        }
        self.refresh_bounds();
        self.commit();
        true
    }

    /// Role-specific property values for the selection.
    #[must_use]
    pub fn selected_properties(&self) -> PropertySheet {
        match self.selected_index() {
            Some(ix) => properties::read_properties(&self.fragment, &self.sheet, ix),
            None => PropertySheet::Empty,
        }
    }

    /// The selection with its resolved box, for the overlay.
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        let id = self.stage.selection()?;
        let ix = self.fragment.index_of(id)?;
        let el = self.fragment.element(ix)?;
        Some(Selection {
            id,
            tag: el.tag.clone(),
            role: el.role(),
            bounds: self.bounds.get(&ix).copied().unwrap_or_default(),
        })
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Vec<EditorEvent> {
        let Some(html) = self.history.undo().map(str::to_string) else {
            return Vec::new();
        };
        self.restore(&html)
    }

    pub fn redo(&mut self) -> Vec<EditorEvent> {
        let Some(html) = self.history.redo().map(str::to_string) else {
            return Vec::new();
        };
        self.restore(&html)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Swap in a history snapshot. Never commits; the snapshot is
    /// already in the log.
    fn restore(&mut self, html: &str) -> Vec<EditorEvent> {
        self.fragment = parse_fragment_html(html);
        self.fragment.assign_ids(&mut self.alloc);
        self.stage.clear();
        self.refresh_bounds();
        vec![
            EditorEvent::FragmentReplaced,
            EditorEvent::SelectionChanged(None),
        ]
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Route a key press. Returns whether it was handled, so callers
    /// can suppress platform defaults.
    pub fn key_down(&mut self, key: &str, modifiers: Modifiers) -> bool {
        if self.stage.is_editing() {
            // Keys belong to the text being edited
            return false;
        }
        let Some(action) = ShortcutMap::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
        ) else {
            return false;
        };
        match action {
            ShortcutAction::Undo => {
                self.undo();
                true
            }
            ShortcutAction::Redo => {
                self.redo();
                true
            }
            ShortcutAction::Delete => {
                if self.stage.selection().is_some() {
                    self.delete_selection();
                    true
                } else {
                    false
                }
            }
        }
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Compose the standalone export document around the live fragment.
    #[must_use]
    pub fn export_html(&self) -> String {
        compose_document(&self.fragment, &self.styles)
    }

    pub fn export_to_file(&self, path: &Path) -> PosterResult<()> {
        write_html_file(path, &self.export_html())
    }

    /// Load an image file and point the selected image's `src` at it
    /// as a base64 `data:` URL. One commit on success.
    pub fn set_image_from_file(&mut self, path: &Path) -> PosterResult<bool> {
        let url = image_data_url(path)?;
        Ok(self.apply_property("src", &url))
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn selected_index(&self) -> Option<NodeIndex> {
        self.stage
            .selection()
            .and_then(|id| self.fragment.index_of(id))
    }

    fn refresh_bounds(&mut self) {
        self.bounds = resolve_geometry(&self.fragment, &self.sheet);
    }

    fn commit(&mut self) {
        let html = serialize_fragment(&self.fragment);
        log::debug!("commit {}: {} bytes", self.history.len(), html.len());
        self.history.commit(&html);
    }

    /// Pin an element at a canvas position. `left`/`top` are written
    /// parent-relative, so the box lands where the drag put it.
    fn apply_position(&mut self, ix: NodeIndex, x: f32, y: f32) {
        let (ox, oy) = self
            .fragment
            .parent(ix)
            .and_then(|p| self.bounds.get(&p))
            .map_or((0.0, 0.0), |b| (b.x, b.y));
        if let Some(el) = self.fragment.element_mut(ix) {
            el.style.set("position", "absolute");
            el.style.set("left", &format_px(x - ox));
            el.style.set("top", &format_px(y - oy));
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poster_core::export::GENERATED_BY;

    #[test]
    fn default_poster_loads_identified() {
        let mut session = EditorSession::new();
        let events = session.load_default();

        assert!(events.contains(&EditorEvent::FragmentReplaced));
        // container, title, subtitle, strong, hero
        assert_eq!(session.fragment.id_index.len(), 5);
        assert_eq!(session.selection(), None);
        assert!(!session.can_undo(), "initial state is the history floor");
    }

    #[test]
    fn export_wraps_fragment_and_styles() {
        let mut session = EditorSession::new();
        session.load_default();
        let html = session.export_html();

        assert!(html.contains(GENERATED_BY));
        assert!(html.contains("Summer Sale"));
        assert!(html.contains(".poster"));
    }

    #[test]
    fn secondary_button_is_ignored() {
        let mut session = EditorSession::new();
        session.load_default();
        let events = session.pointer_down(100.0, 100.0, PointerButton::Secondary);
        assert!(events.is_empty());
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn add_text_commits_and_reports_the_new_element() {
        let mut session = EditorSession::new();
        session.load_default();

        let events = session.add_text();
        assert_eq!(events.len(), 1);
        let EditorEvent::ElementAdded(id) = events[0].clone() else {
            panic!("expected ElementAdded, got {:?}", events[0]);
        };
        let el = session.fragment.element_by_id(id).expect("new element");
        assert_eq!(el.tag, "p");
        assert_eq!(el.style.get("left"), Some("50px"));
        assert!(session.can_undo());
    }

    #[test]
    fn add_image_uses_placeholder_defaults() {
        let mut session = EditorSession::new();
        session.load_default();

        let events = session.add_image();
        let EditorEvent::ElementAdded(id) = events[0].clone() else {
            panic!("expected ElementAdded");
        };
        let el = session.fragment.element_by_id(id).expect("new image");
        assert_eq!(el.attr("src"), Some("https://via.placeholder.com/150"));
        assert_eq!(el.attr("alt"), Some("New Image"));
        assert_eq!(el.style.get("width"), Some("150px"));
    }
}
