// Simple rhythm builder - Generates a one-measure rhythm from a time signature,
// a subdivision and an accent pattern

use super::duration::{DurationError, MAX_GENERATED_ELEMENTS, fill_with_rests};
use super::model::{Measure, NoteValue, Rhythm, RhythmElement, RhythmNote, TimeSignature};
use serde::{Deserialize, Serialize};

/// Accent pattern applied to generated notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Emphasis {
    All,
    None,
    #[default]
    FirstOnly,
    Alternating,
}

impl Emphasis {
    fn is_emphasized(self, index: usize) -> bool {
        match self {
            Emphasis::All => true,
            Emphasis::None => false,
            Emphasis::FirstOnly => index == 0,
            Emphasis::Alternating => index % 2 == 0,
        }
    }
}

/// Compact description the UI keeps next to the full rhythm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleRhythm {
    pub time_signature: TimeSignature,
    /// Note value per sub-beat (8 = eighths), 0 = the signature's denominator
    pub subdivision: u32,
    pub emphasis: Emphasis,
}

impl Default for SimpleRhythm {
    fn default() -> Self {
        Self {
            time_signature: TimeSignature::four_four(),
            subdivision: 0,
            emphasis: Emphasis::FirstOnly,
        }
    }
}

impl SimpleRhythm {
    pub fn new(time_signature: TimeSignature, subdivision: u32, emphasis: Emphasis) -> Self {
        Self {
            time_signature,
            subdivision,
            emphasis,
        }
    }

    /// Subdivision with the `0 = auto` rule applied
    pub fn effective_subdivision(&self) -> u32 {
        if self.subdivision == 0 {
            self.time_signature.denominator
        } else {
            self.subdivision
        }
    }

    /// Build the full rhythm
    ///
    /// Fills the measure with as many subdivision notes as fit; a remainder
    /// (e.g. half notes in 3/4) is closed with rests.
    pub fn generate(&self) -> Result<Rhythm, DurationError> {
        if !self.time_signature.is_valid() {
            return Err(DurationError::InvalidTimeSignature(self.time_signature));
        }

        let subdivision = self.effective_subdivision();
        let value = NoteValue::from_denominator(subdivision)
            .ok_or(DurationError::InvalidDenominator(subdivision))?;

        let length = self.time_signature.measure_length();
        let count = (length * subdivision as f64 + 1e-9).floor() as usize;
        if count > MAX_GENERATED_ELEMENTS {
            return Err(DurationError::TooManyElements {
                limit: MAX_GENERATED_ELEMENTS,
            });
        }

        let mut elements: Vec<RhythmElement> = (0..count)
            .map(|index| {
                let mut note = RhythmNote::note(value);
                note.emphasized = self.emphasis.is_emphasized(index);
                note.into()
            })
            .collect();

        let remaining = length - count as f64 * value.duration();
        let rests = fill_with_rests(remaining.max(0.0), subdivision)?;
        elements.extend(rests.into_iter().map(RhythmElement::Note));

        Ok(Rhythm::new(vec![Measure::new(self.time_signature, elements)]))
    }
}
