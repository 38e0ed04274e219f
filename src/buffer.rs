//! The top-level buffer façade: owns the two content buffers, the piece
//! chain, the undo/redo journal, and any open micro-insert session.

use crate::chain::{NodeId, PieceChain};
use crate::history::{Command, History};
use crate::piece::{BufferId, Piece};
use crate::{BufferError, BufferResult};

/// State for an in-progress micro-insert session: a run of append-style
/// insertions the caller wants coalesced into one undo step.
#[derive(Debug)]
struct Session {
    anchor: NodeId,
    position: u32,
}

/// An in-memory piece-table text buffer.
///
/// # Thread Safety
///
/// `TextBuffer` is `Send` but not meant for concurrent mutation: every
/// mutating method takes `&mut self`, so the borrow checker — not a
/// runtime lock — is what keeps edits serialized within the thread that
/// owns the buffer. Share a buffer across threads by message-passing, not
/// by handing out concurrent `&mut` access.
#[derive(Debug)]
pub struct TextBuffer {
    original: Vec<u8>,
    add: Vec<u8>,
    chain: PieceChain,
    history: History,
    session: Option<Session>,
    modified: bool,
}

impl TextBuffer {
    /// Creates a new, empty buffer with unbounded undo history.
    pub fn new() -> Self {
        Self {
            original: Vec::new(),
            add: Vec::new(),
            chain: PieceChain::new(),
            history: History::new(),
            session: None,
            modified: false,
        }
    }

    /// Creates an empty buffer whose undo journal drops the oldest record
    /// once it holds more than `capacity` entries.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            history: History::bounded(capacity),
            ..Self::new()
        }
    }

    /// Creates a buffer seeded with `initial` as the immutable `ORIGINAL`
    /// content.
    pub fn from_bytes(initial: Vec<u8>) -> Self {
        let len = initial.len() as u32;
        let chain = if len == 0 {
            PieceChain::new()
        } else {
            PieceChain::from_piece(Piece::new(BufferId::Original, 0, len))
        };

        Self {
            original: initial,
            add: Vec::new(),
            chain,
            history: History::new(),
            session: None,
            modified: false,
        }
    }

    /// Like [`TextBuffer::from_bytes`], with a bounded undo journal.
    pub fn from_bytes_bounded(initial: Vec<u8>, capacity: usize) -> Self {
        let mut buffer = Self::from_bytes(initial);
        buffer.history = History::bounded(capacity);
        buffer
    }

    fn bytes_of(&self, source: BufferId) -> &[u8] {
        match source {
            BufferId::Original => &self.original,
            BufferId::Add => &self.add,
        }
    }

    fn append_to_add(&mut self, text: &[u8]) -> BufferResult<Piece> {
        self.add
            .try_reserve(text.len())
            .map_err(|_| BufferError::AllocationFailure)?;
        let start = self.add.len() as u32;
        self.add.extend_from_slice(text);
        Ok(Piece::new(BufferId::Add, start, text.len() as u32))
    }

    fn guard_no_session(&self) -> BufferResult<()> {
        if self.session.is_some() {
            Err(BufferError::SessionActive)
        } else {
            Ok(())
        }
    }

    // ==================== Measurements ====================

    /// Total length of the logical document, in bytes.
    #[inline]
    pub fn length(&self) -> u32 {
        self.chain.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    // ==================== Mutations ====================

    /// Inserts `text` at `pos`, journaling a single `Insert` record.
    pub fn insert(&mut self, pos: u32, text: &[u8]) -> BufferResult<()> {
        self.guard_no_session()?;
        if text.is_empty() {
            return Err(BufferError::EmptyInput);
        }
        let len = self.length();
        if pos > len {
            return Err(BufferError::OutOfBounds { pos, len });
        }

        let piece = self.append_to_add(text)?;
        self.chain.insert_piece(pos, piece)?;
        self.history.push(Command::Insert {
            position: pos,
            text: text.to_vec(),
        });
        self.modified = true;
        log::trace!("insert at {pos}: {} bytes", text.len());
        Ok(())
    }

    /// Removes `len` bytes starting at `pos`, journaling a single `Remove`
    /// record that carries the literal bytes removed (so undo needs no
    /// further reads from the chain).
    pub fn remove(&mut self, pos: u32, len: u32) -> BufferResult<()> {
        self.guard_no_session()?;
        if len == 0 {
            return Err(BufferError::EmptyInput);
        }
        let doc_len = self.length();
        let end = pos
            .checked_add(len)
            .ok_or(BufferError::OutOfBounds { pos, len: doc_len })?;
        if end > doc_len {
            return Err(BufferError::OutOfBounds { pos: end, len: doc_len });
        }

        let removed = self.slice(pos, len)?;
        self.chain.remove_range(pos, len)?;
        self.history.push(Command::Remove {
            position: pos,
            text: removed,
        });
        self.modified = true;
        log::trace!("remove at {pos}: {len} bytes");
        Ok(())
    }

    /// Removes `len` bytes at `pos` and inserts `text` in their place,
    /// journaled as a single `Replace` record rather than as separate
    /// remove-then-insert records — a single `undo()` reverses both
    /// halves.
    pub fn replace(&mut self, pos: u32, len: u32, text: &[u8]) -> BufferResult<()> {
        self.guard_no_session()?;
        let doc_len = self.length();
        let end = pos
            .checked_add(len)
            .ok_or(BufferError::OutOfBounds { pos, len: doc_len })?;
        if end > doc_len {
            return Err(BufferError::OutOfBounds { pos: end, len: doc_len });
        }
        if len == 0 || text.is_empty() {
            return Err(BufferError::EmptyInput);
        }

        let removed = self.slice(pos, len)?;
        self.chain.remove_range(pos, len)?;
        let piece = self.append_to_add(text)?;
        self.chain.insert_piece(pos, piece)?;
        self.history.push(Command::Replace {
            position: pos,
            removed,
            inserted: text.to_vec(),
        });
        self.modified = true;
        log::trace!("replace at {pos}: {len} bytes removed, {} inserted", text.len());
        Ok(())
    }

    // ==================== Micro-insert session ====================

    /// Opens a micro-insert session anchored at `pos`. Other mutating
    /// operations fail with `SessionActive` until `session_end` or
    /// `session_abort` closes it.
    pub fn session_begin(&mut self, pos: u32) -> BufferResult<()> {
        if self.session.is_some() {
            return Err(BufferError::SessionActive);
        }
        let len = self.length();
        if pos > len {
            return Err(BufferError::OutOfBounds { pos, len });
        }

        let anchor_piece = Piece::new(BufferId::Add, self.add.len() as u32, 0);
        let anchor = self.chain.insert_anchor(pos, anchor_piece)?;
        self.session = Some(Session { anchor, position: pos });
        log::trace!("session_begin at {pos}");
        Ok(())
    }

    /// Appends `text` to the open session's accumulated insert.
    pub fn session_append(&mut self, text: &[u8]) -> BufferResult<()> {
        let anchor = self.session.as_ref().ok_or(BufferError::NoSession)?.anchor;
        if text.is_empty() {
            return Err(BufferError::EmptyInput);
        }

        self.add
            .try_reserve(text.len())
            .map_err(|_| BufferError::AllocationFailure)?;
        self.add.extend_from_slice(text);
        self.chain.extend_anchor(anchor, text.len() as u32);
        self.modified = true;
        Ok(())
    }

    /// Closes the session, journaling everything accumulated since
    /// `session_begin` as a single `Insert` record.
    pub fn session_end(&mut self) -> BufferResult<()> {
        let session = self.session.take().ok_or(BufferError::NoSession)?;
        let piece = self.chain.piece(session.anchor);
        let accumulated = self.add[piece.start as usize..piece.end() as usize].to_vec();
        log::trace!("session_end: {} bytes", accumulated.len());
        self.history.push(Command::Insert {
            position: session.position,
            text: accumulated,
        });
        Ok(())
    }

    /// Cancels the open session: its anchor is trimmed out of the logical
    /// document. The bytes it wrote to `ADD` remain there (content buffers
    /// never shrink) but are no longer referenced by any live piece.
    pub fn session_abort(&mut self) -> BufferResult<()> {
        let session = self.session.take().ok_or(BufferError::NoSession)?;
        self.chain.abort_anchor(session.anchor);
        log::trace!("session_abort");
        Ok(())
    }

    pub fn session_active(&self) -> bool {
        self.session.is_some()
    }

    // ==================== Undo / Redo ====================

    fn apply_inverse(&mut self, command: &Command) -> BufferResult<()> {
        match command {
            Command::Insert { position, text } => {
                self.chain.remove_range(*position, text.len() as u32)?;
            }
            Command::Remove { position, text } => {
                let piece = self.append_to_add(text)?;
                self.chain.insert_piece(*position, piece)?;
            }
            Command::Replace {
                position,
                removed,
                inserted,
            } => {
                self.chain.remove_range(*position, inserted.len() as u32)?;
                let piece = self.append_to_add(removed)?;
                self.chain.insert_piece(*position, piece)?;
            }
        }
        Ok(())
    }

    fn apply_forward(&mut self, command: &Command) -> BufferResult<()> {
        match command {
            Command::Insert { position, text } => {
                let piece = self.append_to_add(text)?;
                self.chain.insert_piece(*position, piece)?;
            }
            Command::Remove { position, text } => {
                self.chain.remove_range(*position, text.len() as u32)?;
            }
            Command::Replace {
                position,
                removed,
                inserted,
            } => {
                self.chain.remove_range(*position, removed.len() as u32)?;
                let piece = self.append_to_add(inserted)?;
                self.chain.insert_piece(*position, piece)?;
            }
        }
        Ok(())
    }

    /// Reverses the most recent command, moving it to the redo stack.
    pub fn undo(&mut self) -> BufferResult<()> {
        self.guard_no_session()?;
        let command = self.history.pop_undo().ok_or(BufferError::NothingToUndo)?;
        self.apply_inverse(&command)?;
        self.modified = true;
        log::trace!("undo");
        Ok(())
    }

    /// Re-applies the most recently undone command, moving it back to the
    /// undo stack.
    pub fn redo(&mut self) -> BufferResult<()> {
        self.guard_no_session()?;
        let command = self.history.pop_redo().ok_or(BufferError::NothingToRedo)?;
        self.apply_forward(&command)?;
        self.modified = true;
        log::trace!("redo");
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ==================== Queries ====================

    /// Returns the byte at `pos`.
    pub fn char_at(&self, pos: u32) -> BufferResult<u8> {
        let len = self.length();
        if pos >= len {
            return Err(BufferError::OutOfBounds { pos, len });
        }
        let resolved = self.chain.resolve(pos)?;
        let piece = self.chain.piece(resolved.node);
        let buf = self.bytes_of(piece.source);
        Ok(buf[(piece.start + resolved.local_offset) as usize])
    }

    /// Returns a freshly allocated copy of the `n` bytes starting at `pos`.
    pub fn slice(&self, pos: u32, n: u32) -> BufferResult<Vec<u8>> {
        let len = self.length();
        let end = pos.checked_add(n).ok_or(BufferError::OutOfBounds { pos, len })?;
        if end > len {
            return Err(BufferError::OutOfBounds { pos: end, len });
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        out.try_reserve_exact(n as usize)
            .map_err(|_| BufferError::AllocationFailure)?;

        let mut logical = 0u32;
        for piece in self.chain.iter() {
            let piece_start = logical;
            let piece_end = logical + piece.len;
            logical = piece_end;

            if piece_end <= pos {
                continue;
            }
            if piece_start >= end {
                break;
            }

            let local_start = pos.saturating_sub(piece_start);
            let local_end = (end - piece_start).min(piece.len);
            let buf = self.bytes_of(piece.source);
            let s = (piece.start + local_start) as usize;
            let e = (piece.start + local_end) as usize;
            out.extend_from_slice(&buf[s..e]);

            if piece_end >= end {
                break;
            }
        }

        Ok(out)
    }

    fn byte_iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.chain.iter().flat_map(move |piece| {
            let buf = self.bytes_of(piece.source);
            buf[piece.start as usize..piece.end() as usize].iter().copied()
        })
    }

    /// Returns line `k` (1-indexed), without its terminating newline.
    pub fn line(&self, k: u32) -> BufferResult<Vec<u8>> {
        if k == 0 {
            return Err(BufferError::OutOfBounds { pos: k, len: self.line_count() });
        }

        let mut current = 1u32;
        let mut collected = Vec::new();

        for byte in self.byte_iter() {
            if byte == b'\n' {
                if current == k {
                    return Ok(collected);
                }
                current += 1;
                continue;
            }
            if current == k {
                collected.push(byte);
            }
        }

        if current == k {
            Ok(collected)
        } else {
            Err(BufferError::OutOfBounds { pos: k, len: current })
        }
    }

    /// Total number of lines; an empty document has one (empty) line, and
    /// a document ending in `\n` counts the empty line after it.
    pub fn line_count(&self) -> u32 {
        let mut count = 1u32;
        for byte in self.byte_iter() {
            if byte == b'\n' {
                count += 1;
            }
        }
        count
    }

    /// Materializes the entire logical document.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length() as usize);
        for piece in self.chain.iter() {
            let buf = self.bytes_of(piece.source);
            out.extend_from_slice(&buf[piece.start as usize..piece.end() as usize]);
        }
        out
    }

    // ==================== State queries ====================

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Human-readable dump of the document, the piece chain, and both
    /// journal stacks. For debugging only; the format is not stable.
    pub fn dump(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "document ({} bytes): {:?}",
            self.length(),
            String::from_utf8_lossy(&self.to_bytes())
        );

        let _ = writeln!(out, "pieces:");
        for piece in self.chain.iter() {
            let _ = writeln!(out, "  {:?} start={} len={}", piece.source, piece.start, piece.len);
        }

        let _ = writeln!(out, "undo stack ({} entries, top last):", self.history.undo_count());
        for command in self.history.undo_iter() {
            let _ = writeln!(out, "  {command:?}");
        }

        let _ = writeln!(out, "redo stack ({} entries, top last):", self.history.redo_count());
        for command in self.history.redo_iter() {
            let _ = writeln!(out, "  {command:?}");
        }

        out
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TextBuffer {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.chain.abort_anchor(session.anchor);
        }
    }
}

impl From<&[u8]> for TextBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for TextBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}
