//! Linear history of fragment snapshots.
//!
//! Every committed state is the full serialized fragment, so undo and
//! redo replace the whole document in one step. Committing after an
//! undo truncates the redo branch; those states are gone for good.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Serialized body fragment.
    pub html: String,
    /// Wall-clock commit time, milliseconds since the epoch.
    pub timestamp_ms: u64,
}

/// Append-with-truncation log with a cursor at the current state.
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
    /// Index of the current entry. Meaningless while `entries` is empty.
    cursor: usize,
}

impl HistoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
        }
    }

    /// Commit a snapshot as the new current state, discarding any
    /// undone states after the cursor. Appends unconditionally, even
    /// when the snapshot equals the current entry.
    pub fn commit(&mut self, html: &str) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(HistoryEntry {
            html: html.to_string(),
            timestamp_ms: now_ms(),
        });
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one state. `None` at the oldest state.
    pub fn undo(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].html.as_str())
    }

    /// Step forward one state. `None` at the newest state.
    pub fn redo(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].html.as_str())
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The entry the cursor sits on, if anything was ever committed.
    #[must_use]
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_log_has_nothing_to_step_to() {
        let mut log = HistoryLog::new();
        assert!(!log.can_undo());
        assert!(!log.can_redo());
        assert_eq!(log.undo(), None);
        assert_eq!(log.redo(), None);
        assert!(log.current().is_none());
    }

    #[test]
    fn first_commit_becomes_current() {
        let mut log = HistoryLog::new();
        log.commit("<p>a</p>");
        assert_eq!(log.current().map(|e| e.html.as_str()), Some("<p>a</p>"));
        assert!(!log.can_undo(), "single entry has no previous state");
        assert!(!log.can_redo());
    }

    #[test]
    fn undo_and_redo_walk_the_line() {
        let mut log = HistoryLog::new();
        log.commit("<p>a</p>");
        log.commit("<p>b</p>");
        log.commit("<p>c</p>");

        assert_eq!(log.undo(), Some("<p>b</p>"));
        assert_eq!(log.undo(), Some("<p>a</p>"));
        assert_eq!(log.undo(), None, "oldest state is a hard stop");

        assert_eq!(log.redo(), Some("<p>b</p>"));
        assert_eq!(log.redo(), Some("<p>c</p>"));
        assert_eq!(log.redo(), None, "newest state is a hard stop");
    }

    #[test]
    fn commit_after_undo_discards_redo_branch() {
        let mut log = HistoryLog::new();
        log.commit("<p>a</p>");
        log.commit("<p>b</p>");
        log.undo();
        assert!(log.can_redo());

        log.commit("<p>a2</p>");
        assert!(!log.can_redo(), "redo branch must be discarded");
        assert_eq!(log.len(), 2);
        assert_eq!(log.undo(), Some("<p>a</p>"));
        assert_eq!(log.redo(), Some("<p>a2</p>"));
    }

    #[test]
    fn identical_snapshot_still_appends() {
        let mut log = HistoryLog::new();
        log.commit("<p>a</p>");
        log.commit("<p>a</p>");
        assert_eq!(log.len(), 2);
        assert!(log.can_undo());
    }
}
