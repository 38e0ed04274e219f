//! # edit-buffer
//!
//! An in-memory piece-table text buffer: the editing core for a text
//! editor or any tool that has to accept point insertions, range
//! deletions, and replacements against a potentially large initial
//! document while supporting unbounded undo and redo.
//!
//! ## Why a Piece Table, Not a Rope
//!
//! This crate deliberately does *not* use a rope. Two append-only byte
//! buffers (`ORIGINAL`, fixed at construction, and `ADD`, which only
//! grows) back a chain of small view descriptors ("pieces") that together
//! name the logical document. Editing never copies the document's bytes —
//! it only splits and relinks pieces. The tradeoff against a balanced tree
//! is deliberate: a piece table keeps undo trivial (a journaled command is
//! just a position and the bytes involved) at the cost of O(pieces)
//! position resolution, which is the right tradeoff for an editor core
//! whose piece count grows far slower than its document size.
//!
//! ## Learning: Ownership Across the Chain
//!
//! ```rust,ignore
//! let mut buf = TextBuffer::from_bytes(b"Hello".to_vec());
//! buf.insert(5, b", world!")?;   // buf OWNS the chain; mutation needs &mut
//! let text = buf.to_bytes();     // freshly allocated, owned by the caller
//! buf.undo()?;                   // reverses the insert using the journal,
//!                                 // not by aliasing the piece that held it
//! ```
//!
//! ## Scope
//!
//! This crate indexes by byte offset over a caller-supplied byte sequence;
//! it has no notion of Unicode grapheme clusters, no file I/O, no
//! cursors/selections, and no syntax awareness. Those are the concerns of
//! the editor built on top of this core.

mod buffer;
mod chain;
mod history;
mod piece;

pub use buffer::TextBuffer;

/// Result type for buffer operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("position {pos} is out of bounds (document length {len})")]
    OutOfBounds { pos: u32, len: u32 },

    #[error("operation requires non-empty input")]
    EmptyInput,

    #[error("a micro-insert session is already active")]
    SessionActive,

    #[error("no micro-insert session is active")]
    NoSession,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("allocation failed while growing the buffer")]
    AllocationFailure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_creation() {
        let buffer = TextBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.length(), 0);
    }

    #[test]
    fn buffer_from_bytes() {
        let buffer = TextBuffer::from_bytes(b"Hello, World!".to_vec());
        assert_eq!(buffer.length(), 13);
        assert_eq!(buffer.to_bytes(), b"Hello, World!");
    }

    #[test]
    fn insert_and_remove() {
        let mut buffer = TextBuffer::new();
        buffer.insert(0, b"Hello").unwrap();
        assert_eq!(buffer.to_bytes(), b"Hello");

        buffer.insert(5, b", World!").unwrap();
        assert_eq!(buffer.to_bytes(), b"Hello, World!");

        buffer.remove(5, 2).unwrap();
        assert_eq!(buffer.to_bytes(), b"HelloWorld!");
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut buffer = TextBuffer::new();
        buffer.insert(0, b"Hello").unwrap();
        buffer.insert(5, b" World").unwrap();
        assert_eq!(buffer.to_bytes(), b"Hello World");

        buffer.undo().unwrap();
        assert_eq!(buffer.to_bytes(), b"Hello");

        buffer.redo().unwrap();
        assert_eq!(buffer.to_bytes(), b"Hello World");
    }

    #[test]
    fn line_operations() {
        let buffer = TextBuffer::from_bytes(b"Line 1\nLine 2\nLine 3".to_vec());
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line(1).unwrap(), b"Line 1");
        assert_eq!(buffer.line(2).unwrap(), b"Line 2");
        assert_eq!(buffer.line(3).unwrap(), b"Line 3");
        assert!(buffer.line(4).is_err());
    }

    // The six end-to-end scenarios from the design's testable-properties
    // section, reproduced verbatim against byte literals.

    #[test]
    fn scenario_1_sequential_inserts() {
        let mut buffer = TextBuffer::from_bytes(b"Hola\nCola\nGola".to_vec());
        assert_eq!(buffer.length(), 14);

        buffer.insert(14, b", Hehe").unwrap();
        assert_eq!(buffer.to_bytes(), b"Hola\nCola\nGola, Hehe");
        assert_eq!(buffer.length(), 20);

        buffer.insert(20, b", Hehe").unwrap();
        assert_eq!(buffer.to_bytes(), b"Hola\nCola\nGola, Hehe, Hehe");

        buffer.insert(0, b"NEW_").unwrap();
        assert_eq!(buffer.to_bytes(), b"NEW_Hola\nCola\nGola, Hehe, Hehe");
        assert_eq!(buffer.length(), 30);
    }

    #[test]
    fn scenario_2_undo_redo_sequence() {
        let mut buffer = TextBuffer::from_bytes(b"Hola\nCola\nGola".to_vec());
        buffer.insert(14, b", Hehe").unwrap();
        buffer.insert(20, b", Hehe").unwrap();
        buffer.insert(0, b"NEW_").unwrap();

        buffer.undo().unwrap();
        assert_eq!(buffer.length(), 26);
        assert_eq!(buffer.to_bytes(), b"Hola\nCola\nGola, Hehe, Hehe");

        buffer.undo().unwrap();
        assert_eq!(buffer.to_bytes(), b"Hola\nCola\nGola, Hehe");

        buffer.redo().unwrap();
        assert_eq!(buffer.to_bytes(), b"Hola\nCola\nGola, Hehe, Hehe");
    }

    #[test]
    fn scenario_3_remove_and_undo() {
        let mut buffer = TextBuffer::from_bytes(b"Hola\nCola\nGola, Hehe, Hehe".to_vec());
        buffer.remove(0, 4).unwrap();
        assert_eq!(buffer.to_bytes(), b"\nCola\nGola, Hehe, Hehe");
        assert_eq!(buffer.length(), 22);

        buffer.undo().unwrap();
        assert_eq!(buffer.length(), 26);
        assert_eq!(buffer.to_bytes(), b"Hola\nCola\nGola, Hehe, Hehe");
    }

    #[test]
    fn scenario_4_line_extraction() {
        let buffer = TextBuffer::from_bytes(b"Hola\nCola\nGola".to_vec());
        assert_eq!(buffer.line(1).unwrap(), b"Hola");
        assert_eq!(buffer.line(2).unwrap(), b"Cola");
        assert_eq!(buffer.line(3).unwrap(), b"Gola");
        assert!(matches!(buffer.line(4), Err(BufferError::OutOfBounds { .. })));
    }

    #[test]
    fn scenario_5_replace_is_one_undo_step() {
        let mut buffer = TextBuffer::from_bytes(b"Hola\nCola\nGola".to_vec());
        buffer.replace(2, 5, b"REPLACED_").unwrap();
        assert_eq!(buffer.to_bytes(), b"HoREPLACED_ola\nGola");

        buffer.undo().unwrap();
        assert_eq!(buffer.to_bytes(), b"Hola\nCola\nGola");

        buffer.redo().unwrap();
        assert_eq!(buffer.to_bytes(), b"HoREPLACED_ola\nGola");
    }

    #[test]
    fn scenario_6_micro_insert_session() {
        let mut buffer = TextBuffer::from_bytes(b"Hola\nCola".to_vec());
        buffer.session_begin(4).unwrap();
        buffer.session_append(b"X").unwrap();
        buffer.session_append(b"Y").unwrap();
        buffer.session_append(b"Z").unwrap();
        buffer.session_end().unwrap();

        assert_eq!(buffer.to_bytes(), b"HolaXYZ\nCola");

        buffer.undo().unwrap();
        assert_eq!(buffer.to_bytes(), b"Hola\nCola");
    }
}
