//! Pointer and keyboard input primitives.
//!
//! The session API takes these instead of raw platform events so the
//! same engine drives a browser overlay, tests, and headless tools.

use serde::{Deserialize, Serialize};

/// Which pointer button an event refers to. Only the primary button
/// drives selection and dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// Modifier keys held during an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    /// The platform command chord: Ctrl on most platforms, ⌘ on macOS.
    #[must_use]
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}
