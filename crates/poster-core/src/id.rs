use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for element identifiers — fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for elements in a fragment.
/// Internally a `Spur` index — 4 bytes, Copy, Eq, Hash in O(1).
///
/// Serialized form lives in the `data-element-id` attribute; see
/// [`crate::model::ELEMENT_ID_ATTR`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// Intern a string as an ElementId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        ElementId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ElementId::intern(&s))
    }
}

/// Hands out `element-{n}` identifiers from a per-session counter.
///
/// Session-scoped rather than a process-global atomic: identifier sequences
/// restart with each editor session, and an id is assigned once per element
/// and never reused while the element exists.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier in the session sequence.
    pub fn next_id(&mut self) -> ElementId {
        let id = ElementId::intern(&format!("element-{}", self.next));
        self.next += 1;
        id
    }

    /// Advance the counter past an identifier already present in a
    /// document, so fresh ids never collide with imported ones.
    pub fn reserve(&mut self, id: &str) {
        if let Some(n) = id
            .strip_prefix("element-")
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.next = self.next.max(n + 1);
        }
    }
}
