// Rhythm validation - Structural checks run before playback
// Positions in errors are 1-based so they can be shown to users as-is

use super::duration::{EPSILON, tuplet_modifier};
use super::model::{Measure, Rhythm, RhythmElement, RhythmNote, TimeSignature, TupletRatio};
use std::fmt;

/// Direction of a measure length mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMismatch {
    TooLong,
    TooShort,
}

impl fmt::Display for LengthMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthMismatch::TooLong => f.write_str("too long"),
            LengthMismatch::TooShort => f.write_str("too short"),
        }
    }
}

/// A problem that makes a rhythm unplayable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Rhythm has no measures")]
    EmptyRhythm,

    #[error("Measure {measure}: invalid time signature {time_signature}")]
    InvalidTimeSignature {
        measure: usize,
        time_signature: TimeSignature,
    },

    #[error(
        "Measure {measure} is {mismatch} for {time_signature}: length {actual:.4}, expected {expected:.4}"
    )]
    InvalidLength {
        measure: usize,
        time_signature: TimeSignature,
        expected: f64,
        actual: f64,
        mismatch: LengthMismatch,
    },

    #[error("Measure {measure}, element {element}: invalid note '{glyph}' (duration {duration})")]
    InvalidNote {
        measure: usize,
        element: usize,
        /// Position inside a tuplet, 1-based
        tuplet_note: Option<usize>,
        glyph: String,
        duration: f64,
    },

    #[error("Measure {measure}, element {element}: tuplet {ratio} has {notes} notes")]
    InvalidTuplet {
        measure: usize,
        element: usize,
        ratio: TupletRatio,
        notes: usize,
    },
}

impl ValidationError {
    /// Measure the error refers to (1-based), if any
    pub fn measure(&self) -> Option<usize> {
        match self {
            ValidationError::EmptyRhythm => None,
            ValidationError::InvalidTimeSignature { measure, .. }
            | ValidationError::InvalidLength { measure, .. }
            | ValidationError::InvalidNote { measure, .. }
            | ValidationError::InvalidTuplet { measure, .. } => Some(*measure),
        }
    }

    /// Stable machine-readable identifier
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::EmptyRhythm => "empty_rhythm",
            ValidationError::InvalidTimeSignature { .. } => "invalid_time_signature",
            ValidationError::InvalidLength { .. } => "invalid_length",
            ValidationError::InvalidNote { .. } => "invalid_note",
            ValidationError::InvalidTuplet { .. } => "invalid_tuplet",
        }
    }
}

/// Check every measure of a rhythm. An empty result means playable.
pub fn validate(rhythm: &Rhythm) -> Vec<ValidationError> {
    if rhythm.is_empty() {
        return vec![ValidationError::EmptyRhythm];
    }

    let mut errors = Vec::new();
    for (index, measure) in rhythm.measures.iter().enumerate() {
        validate_measure(index + 1, measure, &mut errors);
    }
    errors
}

fn validate_measure(number: usize, measure: &Measure, errors: &mut Vec<ValidationError>) {
    let time_signature = measure.time_signature;

    if !time_signature.is_valid() {
        errors.push(ValidationError::InvalidTimeSignature {
            measure: number,
            time_signature,
        });
    } else {
        let expected = time_signature.measure_length();
        let actual = measure.content_length();
        if (actual - expected).abs() > EPSILON {
            errors.push(ValidationError::InvalidLength {
                measure: number,
                time_signature,
                expected,
                actual,
                mismatch: if actual > expected {
                    LengthMismatch::TooLong
                } else {
                    LengthMismatch::TooShort
                },
            });
        }
    }

    for (index, element) in measure.elements.iter().enumerate() {
        let element_number = index + 1;
        match element {
            RhythmElement::Note(note) => {
                check_note(number, element_number, None, note, 1.0, errors);
            }
            RhythmElement::Tuplet(tuplet) => {
                if !tuplet.ratio.is_valid() || tuplet.notes.len() != tuplet.ratio.played as usize
                {
                    errors.push(ValidationError::InvalidTuplet {
                        measure: number,
                        element: element_number,
                        ratio: tuplet.ratio,
                        notes: tuplet.notes.len(),
                    });
                }
                let scale = tuplet_modifier(tuplet.ratio);
                for (inner, note) in tuplet.notes.iter().enumerate() {
                    check_note(number, element_number, Some(inner + 1), note, scale, errors);
                }
            }
        }
    }
}

fn check_note(
    measure: usize,
    element: usize,
    tuplet_note: Option<usize>,
    note: &RhythmNote,
    scale: f64,
    errors: &mut Vec<ValidationError>,
) {
    if note.is_malformed() {
        errors.push(ValidationError::InvalidNote {
            measure,
            element,
            tuplet_note,
            glyph: note.display(),
            duration: note.duration() * scale,
        });
    }
}

impl Rhythm {
    pub fn validate(&self) -> Vec<ValidationError> {
        validate(self)
    }

    /// True when `validate` reports nothing
    pub fn is_playable(&self) -> bool {
        self.validate().is_empty()
    }
}
