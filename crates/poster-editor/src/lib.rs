pub mod history;
pub mod input;
pub mod properties;
pub mod session;
pub mod shortcuts;
pub mod stage;

pub use history::{HistoryEntry, HistoryLog};
pub use input::{Modifiers, PointerButton};
pub use properties::{PropertySheet, apply_property, read_properties};
pub use session::{EditorEvent, EditorSession, Selection};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use stage::{Phase, StageController};
