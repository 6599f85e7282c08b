// RhythmEditor - Working rhythm plus the last version that validated
//
// Every edit goes through the CommandManager, then the working rhythm is
// validated. A clean result becomes the new last-valid rhythm, so the UI can
// offer "revert" while showing the current errors.

use crate::command::manager::CommandManager;
use crate::command::trait_def::{CommandResult, EditCommand};
use crate::rhythm::{Rhythm, ValidationError, deserialize, serialize, validate};
use tracing::debug;

pub struct RhythmEditor {
    working: Rhythm,
    last_valid: Option<Rhythm>,
    errors: Vec<ValidationError>,
    history: CommandManager,
}

impl RhythmEditor {
    pub fn new(rhythm: Rhythm) -> Self {
        let mut editor = Self {
            working: rhythm,
            last_valid: None,
            errors: Vec::new(),
            history: CommandManager::new(),
        };
        editor.revalidate();
        editor
    }

    /// Start from text notation; malformed input is kept and reported
    pub fn from_text(text: &str) -> Self {
        Self::new(deserialize(text))
    }

    pub fn working(&self) -> &Rhythm {
        &self.working
    }

    /// Most recent rhythm that passed validation, if any
    pub fn last_valid(&self) -> Option<&Rhythm> {
        self.last_valid.as_ref()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn text(&self) -> String {
        serialize(&self.working)
    }

    /// Apply an edit and return the resulting validation errors
    pub fn apply(&mut self, command: Box<dyn EditCommand>) -> CommandResult<&[ValidationError]> {
        let description = command.description();
        self.history.execute(command, &mut self.working)?;
        debug!(edit = %description, "Rhythm edited");
        self.revalidate();
        Ok(&self.errors)
    }

    pub fn undo(&mut self) -> CommandResult<String> {
        let description = self.history.undo(&mut self.working)?;
        self.revalidate();
        Ok(description)
    }

    pub fn redo(&mut self) -> CommandResult<String> {
        let description = self.history.redo(&mut self.working)?;
        self.revalidate();
        Ok(description)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the last valid rhythm; clears history. Returns false when
    /// there is nothing to revert to.
    pub fn revert(&mut self) -> bool {
        let Some(last_valid) = self.last_valid.clone() else {
            return false;
        };
        self.working = last_valid;
        self.errors.clear();
        self.history.clear();
        true
    }

    /// Replace the working rhythm outright (e.g. text typed by the user)
    pub fn replace(&mut self, rhythm: Rhythm) {
        self.working = rhythm;
        self.history.clear();
        self.revalidate();
    }

    fn revalidate(&mut self) {
        self.errors = validate(&self.working);
        if self.errors.is_empty() {
            self.last_valid = Some(self.working.clone());
        }
    }
}

impl Default for RhythmEditor {
    fn default() -> Self {
        Self::new(Rhythm::four_on_the_floor())
    }
}
