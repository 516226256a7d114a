use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::error::{CoreError, Result};

/// A stored buffer state together with the edit that produced the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub description: String,
    pub buffer: PixelBuffer,
}

impl Snapshot {
    /// Capture an independent copy of `buffer`.
    pub fn new(description: impl Into<String>, buffer: &PixelBuffer) -> Self {
        Self {
            description: description.into(),
            buffer: buffer.clone(),
        }
    }
}

/// Undo/redo stacks of buffer snapshots.
///
/// Not synchronised; a host sharing one history across threads must guard
/// every push and pop with a lock.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CommandHistory {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        tracing::debug!(undo = self.undo_stack.len(), "pushed undo snapshot");
    }

    pub fn pop_undo(&mut self) -> Result<Snapshot> {
        self.undo_stack.pop().ok_or(CoreError::EmptyHistory)
    }

    pub fn push_redo(&mut self, snapshot: Snapshot) {
        self.redo_stack.push(snapshot);
        tracing::debug!(redo = self.redo_stack.len(), "pushed redo snapshot");
    }

    pub fn pop_redo(&mut self) -> Result<Snapshot> {
        self.redo_stack.pop().ok_or(CoreError::EmptyHistory)
    }

    /// Record a fresh edit. Anything that could have been redone no longer
    /// follows from the new state, so the redo stack is cleared.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.push_undo(snapshot);
        if !self.redo_stack.is_empty() {
            tracing::debug!(dropped = self.redo_stack.len(), "cleared redo stack");
            self.redo_stack.clear();
        }
    }

    /// Move the most recent undo entry onto the redo stack and return it.
    pub fn undo(&mut self) -> Result<Snapshot> {
        let snapshot = self.pop_undo()?;
        self.push_redo(snapshot.clone());
        Ok(snapshot)
    }

    /// Move the most recent redo entry onto the undo stack and return it.
    pub fn redo(&mut self) -> Result<Snapshot> {
        let snapshot = self.pop_redo()?;
        self.push_undo(snapshot.clone());
        Ok(snapshot)
    }

    /// Undo `n` steps and return the last entry moved. Fails without
    /// touching either stack if fewer than `n` entries are available.
    pub fn undo_many(&mut self, n: NonZeroUsize) -> Result<Snapshot> {
        if self.undo_stack.len() < n.get() {
            return Err(CoreError::EmptyHistory);
        }
        let mut last = self.undo()?;
        for _ in 1..n.get() {
            last = self.undo()?;
        }
        Ok(last)
    }

    /// Redo `n` steps and return the last entry moved. Fails without
    /// touching either stack if fewer than `n` entries are available.
    pub fn redo_many(&mut self, n: NonZeroUsize) -> Result<Snapshot> {
        if self.redo_stack.len() < n.get() {
            return Err(CoreError::EmptyHistory);
        }
        let mut last = self.redo()?;
        for _ in 1..n.get() {
            last = self.redo()?;
        }
        Ok(last)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|s| s.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|s| s.description.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
