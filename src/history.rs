//! The command journal driving undo and redo.
//!
//! ## Learning: The Command Pattern
//!
//! Each edit is stored as a self-contained record: a position plus the
//! literal bytes involved. That is enough to replay the edit forward or
//! invert it, without ever aliasing a piece that is still live in the
//! chain — which is exactly the bug the source's earlier, pointer-based
//! journal design could never fully shake (see the crate-level docs for
//! why that design was rejected).

use std::collections::VecDeque;

/// One journaled edit, sufficient to both apply and invert itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Insert { position: u32, text: Vec<u8> },
    Remove { position: u32, text: Vec<u8> },
    Replace {
        position: u32,
        removed: Vec<u8>,
        inserted: Vec<u8>,
    },
}

/// Undo/redo stacks of [`Command`] records.
///
/// Bounded by an optional capacity: once the undo stack is full, pushing a
/// new command drops the oldest one from the bottom. This never touches
/// the redo stack and never reorders what remains, so it cannot corrupt
/// the document — it only forfeits how far back undo can reach. The
/// default constructor is unbounded, matching the engine's "unbounded undo
/// and redo" contract; callers that want bounded memory use
/// [`History::bounded`].
#[derive(Debug, Clone)]
pub(crate) struct History {
    undo_stack: VecDeque<Command>,
    redo_stack: Vec<Command>,
    capacity: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: None,
        }
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(capacity.min(1024)),
            redo_stack: Vec::new(),
            capacity: Some(capacity),
        }
    }

    /// Pushes a command onto the undo stack and clears the redo stack.
    pub fn push(&mut self, command: Command) {
        self.redo_stack.clear();
        self.undo_stack.push_back(command);
        if let Some(capacity) = self.capacity {
            while self.undo_stack.len() > capacity {
                self.undo_stack.pop_front();
            }
        }
    }

    /// Pops the top undo command, moving it to the redo stack.
    pub fn pop_undo(&mut self) -> Option<Command> {
        let command = self.undo_stack.pop_back()?;
        self.redo_stack.push(command.clone());
        Some(command)
    }

    /// Pops the top redo command, moving it back to the undo stack.
    pub fn pop_redo(&mut self) -> Option<Command> {
        let command = self.redo_stack.pop()?;
        self.undo_stack.push_back(command.clone());
        Some(command)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_iter(&self) -> impl Iterator<Item = &Command> {
        self.undo_stack.iter()
    }

    pub fn redo_iter(&self) -> impl Iterator<Item = &Command> {
        self.redo_stack.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
