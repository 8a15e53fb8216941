//! Undo/redo history over diagram snapshots.

use serde::{Deserialize, Serialize};

use crate::store::Diagram;
use crate::viewport::Viewport;

/// Maximum number of snapshots retained; the oldest is evicted first.
pub const MAX_HISTORY: usize = 50;

/// One recorded document state.
///
/// Selection is deliberately not part of a snapshot; restoring a
/// snapshot clears it instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub diagram: Diagram,
    pub viewport: Viewport,
}

/// Ordered snapshot sequence with a cursor at the current state.
///
/// Entries are independent deep copies: callers may mutate what
/// [`History::undo`] and [`History::redo`] hand back without
/// disturbing the stored timeline.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Snapshot>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot as the new current state.
    ///
    /// Any states after the cursor (undone and not redone) are
    /// discarded first, so redo is unavailable after a fresh commit.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        if self.entries.len() > MAX_HISTORY {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one state. Returns `None` at the oldest retained
    /// snapshot (or when nothing was ever committed).
    pub fn undo(&mut self) -> Option<Snapshot> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    /// Step forward one state. Returns `None` at the newest snapshot.
    pub fn redo(&mut self) -> Option<Snapshot> {
        if self.entries.is_empty() || self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0 && !self.entries.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
