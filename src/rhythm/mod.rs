// Rhythm module - Data model, text notation, validation and duration math

pub mod duration;
pub mod grammar;
pub mod model;
pub mod simple;
pub mod validation;

pub use duration::{
    DurationError, EPSILON, MAX_GENERATED_ELEMENTS, change_time_signature, dot_modifier,
    effective_duration, fill_with_rests, tuplet_modifier,
};
pub use grammar::{MAX_DOTS, deserialize, serialize};
pub use model::{
    Glyph, Measure, NoteKind, NoteValue, Rhythm, RhythmElement, RhythmNote, RhythmTuplet,
    TimeSignature, TupletRatio,
};
pub use simple::{Emphasis, SimpleRhythm};
pub use validation::{LengthMismatch, ValidationError, validate};
