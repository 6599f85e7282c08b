// Concrete rhythm edit commands
// Indices are 0-based; every command stores what it replaced for undo

use crate::command::trait_def::{CommandError, CommandResult, EditCommand};
use crate::rhythm::{
    MAX_DOTS, Measure, Rhythm, RhythmElement, RhythmNote, TimeSignature, change_time_signature,
};

fn measure_mut(rhythm: &mut Rhythm, measure: usize) -> CommandResult<&mut Measure> {
    rhythm
        .measures
        .get_mut(measure)
        .ok_or(CommandError::NoSuchMeasure(measure))
}

fn element_mut(
    rhythm: &mut Rhythm,
    measure: usize,
    index: usize,
) -> CommandResult<&mut RhythmElement> {
    measure_mut(rhythm, measure)?
        .elements
        .get_mut(index)
        .ok_or(CommandError::NoSuchElement { measure, index })
}

/// A plain note, or one note inside a tuplet
fn note_mut(
    rhythm: &mut Rhythm,
    measure: usize,
    index: usize,
    tuplet_note: Option<usize>,
) -> CommandResult<&mut RhythmNote> {
    match (element_mut(rhythm, measure, index)?, tuplet_note) {
        (RhythmElement::Note(note), None) => Ok(note),
        (RhythmElement::Tuplet(tuplet), Some(note)) => {
            tuplet
                .notes
                .get_mut(note)
                .ok_or(CommandError::NoSuchTupletNote {
                    measure,
                    index,
                    note,
                })
        }
        (RhythmElement::Tuplet(_), None) | (RhythmElement::Note(_), Some(_)) => {
            Err(CommandError::NoSuchTupletNote {
                measure,
                index,
                note: tuplet_note.unwrap_or(0),
            })
        }
    }
}

/// Insert an element before `index` (`index == len` appends)
pub struct InsertElementCommand {
    measure: usize,
    index: usize,
    element: RhythmElement,
}

impl InsertElementCommand {
    pub fn new(measure: usize, index: usize, element: impl Into<RhythmElement>) -> Self {
        Self {
            measure,
            index,
            element: element.into(),
        }
    }
}

impl EditCommand for InsertElementCommand {
    fn execute(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let measure = measure_mut(rhythm, self.measure)?;
        if self.index > measure.elements.len() {
            return Err(CommandError::NoSuchElement {
                measure: self.measure,
                index: self.index,
            });
        }
        measure.elements.insert(self.index, self.element.clone());
        Ok(())
    }

    fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let measure = measure_mut(rhythm, self.measure)?;
        if self.index >= measure.elements.len() {
            return Err(CommandError::UndoFailed("Inserted element is gone".into()));
        }
        measure.elements.remove(self.index);
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "Insert element at {} in measure {}",
            self.index + 1,
            self.measure + 1
        )
    }
}

pub struct RemoveElementCommand {
    measure: usize,
    index: usize,
    removed: Option<RhythmElement>,
}

impl RemoveElementCommand {
    pub fn new(measure: usize, index: usize) -> Self {
        Self {
            measure,
            index,
            removed: None,
        }
    }
}

impl EditCommand for RemoveElementCommand {
    fn execute(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let measure = measure_mut(rhythm, self.measure)?;
        if self.index >= measure.elements.len() {
            return Err(CommandError::NoSuchElement {
                measure: self.measure,
                index: self.index,
            });
        }
        self.removed = Some(measure.elements.remove(self.index));
        Ok(())
    }

    fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let removed = self
            .removed
            .take()
            .ok_or_else(|| CommandError::UndoFailed("No removed element stored".into()))?;
        let measure = measure_mut(rhythm, self.measure)?;
        let index = self.index.min(measure.elements.len());
        measure.elements.insert(index, removed);
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "Remove element {} of measure {}",
            self.index + 1,
            self.measure + 1
        )
    }
}

pub struct ReplaceElementCommand {
    measure: usize,
    index: usize,
    element: RhythmElement,
    previous: Option<RhythmElement>,
}

impl ReplaceElementCommand {
    pub fn new(measure: usize, index: usize, element: impl Into<RhythmElement>) -> Self {
        Self {
            measure,
            index,
            element: element.into(),
            previous: None,
        }
    }
}

impl EditCommand for ReplaceElementCommand {
    fn execute(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let slot = element_mut(rhythm, self.measure, self.index)?;
        self.previous = Some(std::mem::replace(slot, self.element.clone()));
        Ok(())
    }

    fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or_else(|| CommandError::UndoFailed("No previous element stored".into()))?;
        *element_mut(rhythm, self.measure, self.index)? = previous;
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "Replace element {} of measure {}",
            self.index + 1,
            self.measure + 1
        )
    }
}

/// Flip the accent of a note; its own inverse
pub struct ToggleEmphasisCommand {
    measure: usize,
    index: usize,
    tuplet_note: Option<usize>,
}

impl ToggleEmphasisCommand {
    pub fn new(measure: usize, index: usize, tuplet_note: Option<usize>) -> Self {
        Self {
            measure,
            index,
            tuplet_note,
        }
    }

    fn toggle(&self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let note = note_mut(rhythm, self.measure, self.index, self.tuplet_note)?;
        note.emphasized = !note.emphasized;
        Ok(())
    }
}

impl EditCommand for ToggleEmphasisCommand {
    fn execute(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        self.toggle(rhythm)
    }

    fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        self.toggle(rhythm)
    }

    fn description(&self) -> String {
        format!(
            "Toggle accent of element {} in measure {}",
            self.index + 1,
            self.measure + 1
        )
    }
}

pub struct SetDotsCommand {
    measure: usize,
    index: usize,
    tuplet_note: Option<usize>,
    dots: u8,
    previous: Option<u8>,
}

impl SetDotsCommand {
    pub fn new(measure: usize, index: usize, tuplet_note: Option<usize>, dots: u8) -> Self {
        Self {
            measure,
            index,
            tuplet_note,
            dots,
            previous: None,
        }
    }
}

impl EditCommand for SetDotsCommand {
    fn execute(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        if self.dots > MAX_DOTS {
            return Err(CommandError::TooManyDots(self.dots));
        }
        let note = note_mut(rhythm, self.measure, self.index, self.tuplet_note)?;
        self.previous = Some(note.dots);
        note.dots = self.dots;
        Ok(())
    }

    fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or_else(|| CommandError::UndoFailed("No previous dot count stored".into()))?;
        note_mut(rhythm, self.measure, self.index, self.tuplet_note)?.dots = previous;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Set {} dot(s) on element {}", self.dots, self.index + 1)
    }
}

/// Insert a measure before `index` (`index == len` appends)
pub struct AddMeasureCommand {
    index: usize,
    measure: Measure,
}

impl AddMeasureCommand {
    pub fn new(index: usize, measure: Measure) -> Self {
        Self { index, measure }
    }
}

impl EditCommand for AddMeasureCommand {
    fn execute(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        if self.index > rhythm.measures.len() {
            return Err(CommandError::NoSuchMeasure(self.index));
        }
        rhythm.measures.insert(self.index, self.measure.clone());
        Ok(())
    }

    fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        if self.index >= rhythm.measures.len() {
            return Err(CommandError::UndoFailed("Added measure is gone".into()));
        }
        rhythm.measures.remove(self.index);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Add measure {}", self.index + 1)
    }
}

pub struct RemoveMeasureCommand {
    index: usize,
    removed: Option<Measure>,
}

impl RemoveMeasureCommand {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            removed: None,
        }
    }
}

impl EditCommand for RemoveMeasureCommand {
    fn execute(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        if self.index >= rhythm.measures.len() {
            return Err(CommandError::NoSuchMeasure(self.index));
        }
        self.removed = Some(rhythm.measures.remove(self.index));
        Ok(())
    }

    fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let removed = self
            .removed
            .take()
            .ok_or_else(|| CommandError::UndoFailed("No removed measure stored".into()))?;
        let index = self.index.min(rhythm.measures.len());
        rhythm.measures.insert(index, removed);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Remove measure {}", self.index + 1)
    }
}

/// Change a measure's time signature, padding or truncating its content
pub struct ChangeTimeSignatureCommand {
    measure: usize,
    time_signature: TimeSignature,
    previous: Option<Measure>,
}

impl ChangeTimeSignatureCommand {
    pub fn new(measure: usize, time_signature: TimeSignature) -> Self {
        Self {
            measure,
            time_signature,
            previous: None,
        }
    }
}

impl EditCommand for ChangeTimeSignatureCommand {
    fn execute(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let measure = measure_mut(rhythm, self.measure)?;
        let changed = change_time_signature(measure, self.time_signature)?;
        self.previous = Some(std::mem::replace(measure, changed));
        Ok(())
    }

    fn undo(&mut self, rhythm: &mut Rhythm) -> CommandResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or_else(|| CommandError::UndoFailed("No previous measure stored".into()))?;
        *measure_mut(rhythm, self.measure)? = previous;
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "Change measure {} to {}",
            self.measure + 1,
            self.time_signature
        )
    }
}
