// EditCommand trait definition

use crate::rhythm::{DurationError, Rhythm};
use thiserror::Error;

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors that can occur while editing a rhythm
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("No measure at index {0}")]
    NoSuchMeasure(usize),

    #[error("No element at index {index} in measure {measure}")]
    NoSuchElement { measure: usize, index: usize },

    #[error("Element {index} in measure {measure} has no tuplet note {note}")]
    NoSuchTupletNote {
        measure: usize,
        index: usize,
        note: usize,
    },

    #[error("Dot count {0} exceeds the maximum")]
    TooManyDots(u8),

    #[error("Time signature change failed: {0}")]
    Duration(#[from] DurationError),

    #[error("Undo failed: {0}")]
    UndoFailed(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

/// An undoable edit of a rhythm
///
/// `execute` must leave the rhythm untouched when it fails, and keep
/// whatever it needs to restore the previous rhythm in `undo`.
pub trait EditCommand: Send {
    fn execute(&mut self, rhythm: &mut Rhythm) -> CommandResult<()>;

    fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<()>;

    /// Human-readable label (e.g. "Undo: Remove element 2 of measure 1")
    fn description(&self) -> String;
}
