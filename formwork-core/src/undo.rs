//! Application-level undo history.
//!
//! Every committed change, whether typed or synthesized by dependency
//! fallbacks, is recorded here as a before/after pair keyed by field path.
//! Replaying an entry goes back through the normal commit path so dependency
//! propagation and validation fire exactly as they would for a fresh edit.

use serde_json::Value;

use crate::schema::FieldPath;

/// One recorded change.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    /// Field that changed.
    pub field_path: FieldPath,
    /// Value before the commit.
    pub previous: Value,
    /// Value after the commit.
    pub new: Value,
}

/// Linear undo/redo history of committed changes.
#[derive(Debug, Default)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
    redo: Vec<UndoEntry>,
}

impl UndoStack {
    /// Record a committed change. A fresh edit invalidates the redo branch.
    pub fn push(&mut self, entry: UndoEntry) {
        self.redo.clear();
        self.entries.push(entry);
    }

    /// Pop the most recent change for replay, moving it to the redo side.
    pub fn undo(&mut self) -> Option<UndoEntry> {
        let entry = self.entries.pop()?;
        self.redo.push(entry.clone());
        Some(entry)
    }

    /// Pop the most recently undone change for replay.
    pub fn redo(&mut self) -> Option<UndoEntry> {
        let entry = self.redo.pop()?;
        self.entries.push(entry.clone());
        Some(entry)
    }

    /// Whether any change can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Whether any undone change can be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Drop all history, e.g. on schema replacement.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.redo.clear();
    }
}
