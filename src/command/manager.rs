// CommandManager - Bounded undo/redo history for rhythm edits

use crate::command::trait_def::{CommandError, CommandResult, EditCommand};
use crate::rhythm::Rhythm;
use std::collections::VecDeque;

const DEFAULT_MAX_HISTORY: usize = 100;

type History = VecDeque<Box<dyn EditCommand>>;

/// Executes edits and keeps bounded undo/redo history
///
/// A new edit clears the redo stack. When the undo stack is full the
/// oldest command is dropped. A command whose undo or redo fails stays
/// where it was, so the user can retry.
pub struct CommandManager {
    undo_stack: History,
    redo_stack: History,
    max_history: usize,
}

impl CommandManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY)
    }

    pub fn with_capacity(max_history: usize) -> Self {
        Self {
            undo_stack: History::with_capacity(max_history),
            redo_stack: History::new(),
            max_history,
        }
    }

    /// Run `command` and record it
    ///
    /// # Errors
    /// Returns the command's error; history is untouched in that case.
    pub fn execute(
        &mut self,
        mut command: Box<dyn EditCommand>,
        rhythm: &mut Rhythm,
    ) -> CommandResult<()> {
        command.execute(rhythm)?;
        self.redo_stack.clear();
        self.push_undo(command);
        Ok(())
    }

    /// Undo the most recent edit, returning its description
    pub fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<String> {
        let command = step(&mut self.undo_stack, CommandError::NothingToUndo, |command| {
            command.undo(rhythm)
        })?;
        let description = command.description();
        self.redo_stack.push_back(command);
        Ok(description)
    }

    /// Re-apply the most recently undone edit, returning its description
    pub fn redo(&mut self, rhythm: &mut Rhythm) -> CommandResult<String> {
        let command = step(&mut self.redo_stack, CommandError::NothingToRedo, |command| {
            command.execute(rhythm)
        })?;
        let description = command.description();
        self.push_undo(command);
        Ok(description)
    }

    fn push_undo(&mut self, command: Box<dyn EditCommand>) {
        self.undo_stack.push_back(command);
        while self.undo_stack.len() > self.max_history {
            self.undo_stack.pop_front();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|command| command.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|command| command.description())
    }

    /// Descriptions of undoable edits, oldest first (for a history panel)
    pub fn history(&self) -> Vec<String> {
        self.undo_stack.iter().map(|command| command.description()).collect()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Change the limit, dropping the oldest edits that no longer fit
    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history;
        while self.undo_stack.len() > max_history {
            self.undo_stack.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

/// Pop the newest command and apply `action` to it
///
/// On failure the command goes back on top of `stack`.
fn step<F>(
    stack: &mut History,
    empty: CommandError,
    action: F,
) -> CommandResult<Box<dyn EditCommand>>
where
    F: FnOnce(&mut dyn EditCommand) -> CommandResult<()>,
{
    let mut command = stack.pop_back().ok_or(empty)?;
    if let Err(e) = action(command.as_mut()) {
        stack.push_back(command);
        return Err(e);
    }
    Ok(command)
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}
