//! Selection and drag state machine for the canvas stage.
//!
//! A click (press then release) resolves the new selection; a press
//! that lands on the element that is already selected arms a drag
//! instead. Dragging clamps the element inside the canvas and commits
//! exactly once, on release or when the pointer leaves the stage.

use poster_core::geometry::{Bounds, Canvas};
use poster_core::id::ElementId;

/// Interaction phase of the stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Nothing selected.
    Idle,
    /// One element selected; `editing` while inline text editing.
    Selected { id: ElementId, editing: bool },
    /// Selected element follows the pointer. The grab offset keeps the
    /// point under the cursor fixed; the size feeds the clamp.
    Dragging {
        id: ElementId,
        grab_x: f32,
        grab_y: f32,
        width: f32,
        height: f32,
    },
}

/// Tracks the selection and drag gesture against a fixed canvas.
pub struct StageController {
    phase: Phase,
    canvas: Canvas,
}

impl StageController {
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self {
            phase: Phase::Idle,
            canvas,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// The selected element in any phase.
    #[must_use]
    pub fn selection(&self) -> Option<ElementId> {
        match self.phase {
            Phase::Idle => None,
            Phase::Selected { id, .. } | Phase::Dragging { id, .. } => Some(id),
        }
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(self.phase, Phase::Selected { editing: true, .. })
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Drop any selection. Used after deletes and history restores.
    pub fn clear(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Primary press. Arms a drag when the press lands on the current
    /// selection; any other press leaves the selection change to the
    /// matching release.
    pub fn press(&mut self, hit: Option<(ElementId, Bounds)>, px: f32, py: f32) {
        if let Phase::Selected { id, editing: false } = self.phase
            && let Some((hit_id, b)) = hit
            && hit_id == id
        {
            self.phase = Phase::Dragging {
                id,
                grab_x: px - b.x,
                grab_y: py - b.y,
                width: b.width,
                height: b.height,
            };
        }
    }

    /// Pointer move. While dragging, returns the next clamped top-left
    /// for the element in canvas coordinates.
    pub fn drag(&mut self, px: f32, py: f32) -> Option<(ElementId, f32, f32)> {
        match self.phase {
            Phase::Dragging {
                id,
                grab_x,
                grab_y,
                width,
                height,
            } => {
                let x = (px - grab_x).clamp(0.0, (self.canvas.width - width).max(0.0));
                let y = (py - grab_y).clamp(0.0, (self.canvas.height - height).max(0.0));
                Some((id, x, y))
            }
            _ => None,
        }
    }

    /// Pointer release. Ends a drag (the caller commits history and
    /// keeps the element selected); otherwise the release is a click
    /// and the hit target becomes the selection, background clearing
    /// it. Returns the element whose drag just ended.
    pub fn release(&mut self, hit: Option<ElementId>) -> Option<ElementId> {
        match self.phase {
            Phase::Dragging { id, .. } => {
                self.phase = Phase::Selected { id, editing: false };
                Some(id)
            }
            _ => {
                self.phase = match hit {
                    Some(id) => Phase::Selected { id, editing: false },
                    None => Phase::Idle,
                };
                None
            }
        }
    }

    /// The pointer left the stage. Ends an active drag like a release
    /// but never touches the selection.
    pub fn leave(&mut self) -> Option<ElementId> {
        match self.phase {
            Phase::Dragging { id, .. } => {
                self.phase = Phase::Selected { id, editing: false };
                Some(id)
            }
            _ => None,
        }
    }

    /// Double-click. Selects the hit element and begins inline editing
    /// when its role allows it. Returns whether editing began.
    pub fn double_click(&mut self, hit: Option<ElementId>, editable: bool) -> bool {
        match hit {
            Some(id) => {
                self.phase = Phase::Selected { id, editing: editable };
                editable
            }
            None => false,
        }
    }

    /// Finish inline editing. Returns the edited element exactly once;
    /// the caller commits.
    pub fn end_edit(&mut self) -> Option<ElementId> {
        if let Phase::Selected { id, editing: true } = self.phase {
            self.phase = Phase::Selected { id, editing: false };
            Some(id)
        } else {
            None
        }
    }
}

impl Default for StageController {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}
