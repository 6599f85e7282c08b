// Rhythm model - Measures, notes, rests and tuplets
// Durations are expressed in whole-note fractions (quarter note = 0.25)

use super::duration::{dot_modifier, tuplet_modifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time signature (numerator/denominator)
/// Example: 6/8 = six eighth notes per measure
///
/// `(0, 0)` is the "not yet assigned" sentinel used while editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    /// Sentinel for a measure whose time signature is not assigned yet
    pub const INCOMPLETE: TimeSignature = TimeSignature {
        numerator: 0,
        denominator: 0,
    };

    /// Creates a time signature without checking it (see `is_valid`)
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Common 4/4 time signature
    pub const fn four_four() -> Self {
        Self::new(4, 4)
    }

    /// Common 3/4 time signature (waltz)
    pub const fn three_four() -> Self {
        Self::new(3, 4)
    }

    /// Common 6/8 time signature
    pub const fn six_eight() -> Self {
        Self::new(6, 8)
    }

    /// Positive numerator and power-of-two denominator
    pub fn is_valid(&self) -> bool {
        self.numerator > 0 && self.denominator.is_power_of_two()
    }

    pub fn is_incomplete(&self) -> bool {
        *self == Self::INCOMPLETE
    }

    /// Length of one measure in whole notes (`numerator / denominator`)
    ///
    /// Returns 0.0 for an invalid signature.
    pub fn measure_length(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Base (un-dotted) note values, whole note down to 1/1024
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoteValue {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
    HundredTwentyEighth,
    TwoHundredFiftySixth,
    FiveHundredTwelfth,
    ThousandTwentyFourth,
}

impl NoteValue {
    /// Every value, longest first
    pub const ALL: [NoteValue; 11] = [
        NoteValue::Whole,
        NoteValue::Half,
        NoteValue::Quarter,
        NoteValue::Eighth,
        NoteValue::Sixteenth,
        NoteValue::ThirtySecond,
        NoteValue::SixtyFourth,
        NoteValue::HundredTwentyEighth,
        NoteValue::TwoHundredFiftySixth,
        NoteValue::FiveHundredTwelfth,
        NoteValue::ThousandTwentyFourth,
    ];

    /// Largest denominator that has a glyph
    pub const MAX_DENOMINATOR: u32 = 1024;

    /// Denominator of the value (quarter = 4)
    pub fn denominator(self) -> u32 {
        1 << (self as u32)
    }

    /// Duration in whole notes
    pub fn duration(self) -> f64 {
        1.0 / self.denominator() as f64
    }

    pub fn from_denominator(denominator: u32) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|value| value.denominator() == denominator)
    }

    /// Lowercase grammar glyph
    pub fn glyph(self) -> char {
        match self {
            NoteValue::Whole => 'w',
            NoteValue::Half => 'h',
            NoteValue::Quarter => 'q',
            NoteValue::Eighth => 'e',
            NoteValue::Sixteenth => 's',
            NoteValue::ThirtySecond => 't',
            NoteValue::SixtyFourth => 'x',
            NoteValue::HundredTwentyEighth => 'o',
            NoteValue::TwoHundredFiftySixth => 'f',
            NoteValue::FiveHundredTwelfth => 'g',
            NoteValue::ThousandTwentyFourth => 'k',
        }
    }

    /// Case-insensitive glyph lookup
    pub fn from_glyph(glyph: char) -> Option<Self> {
        let lower = glyph.to_ascii_lowercase();
        Self::ALL.iter().copied().find(|value| value.glyph() == lower)
    }
}

/// Whether an element sounds or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NoteKind {
    #[default]
    Note,
    Rest,
}

impl NoteKind {
    pub fn is_rest(self) -> bool {
        matches!(self, NoteKind::Rest)
    }
}

/// Duration glyph of a note
///
/// `Malformed` keeps the unparsable source token so the editor can show it
/// and `serialize` can write it back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Glyph {
    Value(NoteValue),
    Malformed(String),
}

/// A single note or rest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RhythmNote {
    pub glyph: Glyph,
    pub kind: NoteKind,
    /// Accent flag (uppercase glyph in the grammar)
    pub emphasized: bool,
    pub dots: u8,
}

impl RhythmNote {
    pub fn new(value: NoteValue, kind: NoteKind, emphasized: bool, dots: u8) -> Self {
        Self {
            glyph: Glyph::Value(value),
            kind,
            emphasized,
            dots,
        }
    }

    /// Unaccented note
    pub fn note(value: NoteValue) -> Self {
        Self::new(value, NoteKind::Note, false, 0)
    }

    /// Accented note
    pub fn accent(value: NoteValue) -> Self {
        Self::new(value, NoteKind::Note, true, 0)
    }

    pub fn rest(value: NoteValue) -> Self {
        Self::new(value, NoteKind::Rest, false, 0)
    }

    /// Placeholder for a token that could not be decoded
    pub fn malformed(source: impl Into<String>) -> Self {
        Self {
            glyph: Glyph::Malformed(source.into()),
            kind: NoteKind::Note,
            emphasized: false,
            dots: 0,
        }
    }

    pub fn dotted(mut self, dots: u8) -> Self {
        self.dots = dots;
        self
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.glyph, Glyph::Malformed(_))
    }

    pub fn value(&self) -> Option<NoteValue> {
        match self.glyph {
            Glyph::Value(value) => Some(value),
            Glyph::Malformed(_) => None,
        }
    }

    /// Display glyph: the case-encoded duration letter, or `?`
    pub fn display(&self) -> String {
        match &self.glyph {
            Glyph::Value(value) if self.emphasized => value.glyph().to_ascii_uppercase().to_string(),
            Glyph::Value(value) => value.glyph().to_string(),
            Glyph::Malformed(_) => "?".to_string(),
        }
    }

    /// Un-dotted base duration (0 for malformed notes)
    pub fn raw_duration(&self) -> f64 {
        self.value().map(NoteValue::duration).unwrap_or(0.0)
    }

    /// Duration including dots, before any tuplet scaling
    pub fn duration(&self) -> f64 {
        self.raw_duration() * dot_modifier(self.dots)
    }
}

/// Tuplet ratio: `played` notes in the time of `implied`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupletRatio {
    pub played: u32,
    pub implied: u32,
}

impl TupletRatio {
    pub const fn new(played: u32, implied: u32) -> Self {
        Self { played, implied }
    }

    pub const fn triplet() -> Self {
        Self::new(3, 2)
    }

    pub fn is_valid(&self) -> bool {
        self.played > 0 && self.implied > 0
    }
}

impl fmt::Display for TupletRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.played, self.implied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RhythmTuplet {
    pub ratio: TupletRatio,
    pub notes: Vec<RhythmNote>,
}

impl RhythmTuplet {
    pub fn new(ratio: TupletRatio, notes: Vec<RhythmNote>) -> Self {
        Self { ratio, notes }
    }

    /// Scaled duration of one inner note
    pub fn note_duration(&self, note: &RhythmNote) -> f64 {
        note.duration() * tuplet_modifier(self.ratio)
    }

    /// Sum of the inner notes, scaled by the ratio
    pub fn duration(&self) -> f64 {
        self.notes.iter().map(|note| self.note_duration(note)).sum()
    }
}

/// Top-level element of a measure
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RhythmElement {
    Note(RhythmNote),
    Tuplet(RhythmTuplet),
}

impl RhythmElement {
    /// Contribution to the measure length
    pub fn duration(&self) -> f64 {
        match self {
            RhythmElement::Note(note) => note.duration(),
            RhythmElement::Tuplet(tuplet) => tuplet.duration(),
        }
    }

    /// Number of beats this element produces when played
    pub fn atom_count(&self) -> usize {
        match self {
            RhythmElement::Note(_) => 1,
            RhythmElement::Tuplet(tuplet) => tuplet.notes.len(),
        }
    }
}

impl From<RhythmNote> for RhythmElement {
    fn from(note: RhythmNote) -> Self {
        RhythmElement::Note(note)
    }
}

impl From<RhythmTuplet> for RhythmElement {
    fn from(tuplet: RhythmTuplet) -> Self {
        RhythmElement::Tuplet(tuplet)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Measure {
    pub time_signature: TimeSignature,
    pub elements: Vec<RhythmElement>,
}

impl Measure {
    pub fn new(time_signature: TimeSignature, elements: Vec<RhythmElement>) -> Self {
        Self {
            time_signature,
            elements,
        }
    }

    /// Measure with no time signature and no content (editing placeholder)
    pub fn incomplete() -> Self {
        Self::new(TimeSignature::INCOMPLETE, Vec::new())
    }

    /// Length required by the time signature
    pub fn expected_length(&self) -> f64 {
        self.time_signature.measure_length()
    }

    /// Sum of element durations, tuplets scaled
    pub fn content_length(&self) -> f64 {
        self.elements.iter().map(RhythmElement::duration).sum()
    }
}

/// Ordered sequence of measures
///
/// Value snapshot: edits build a new `Rhythm` which then replaces the one
/// a scheduler is playing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Rhythm {
    pub measures: Vec<Measure>,
}

impl Rhythm {
    pub fn new(measures: Vec<Measure>) -> Self {
        Self { measures }
    }

    /// Single 4/4 measure of quarter notes with an accented downbeat
    pub fn four_on_the_floor() -> Self {
        let mut elements = vec![RhythmNote::accent(NoteValue::Quarter).into()];
        elements.extend((0..3).map(|_| RhythmNote::note(NoteValue::Quarter).into()));
        Self::new(vec![Measure::new(TimeSignature::four_four(), elements)])
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    /// Length of one pass through every measure, in whole notes
    pub fn total_length(&self) -> f64 {
        self.measures.iter().map(Measure::content_length).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_time_signature_validity() {
        assert!(TimeSignature::four_four().is_valid());
        assert!(TimeSignature::new(7, 8).is_valid());
        assert!(!TimeSignature::new(3, 6).is_valid());
        assert!(!TimeSignature::new(0, 4).is_valid());
        assert!(!TimeSignature::INCOMPLETE.is_valid());
        assert!(TimeSignature::INCOMPLETE.is_incomplete());
        assert_eq!(TimeSignature::six_eight().to_string(), "6/8");
    }

    #[test]
    fn test_measure_length() {
        assert_relative_eq!(TimeSignature::three_four().measure_length(), 0.75);
        assert_relative_eq!(TimeSignature::six_eight().measure_length(), 0.75);
        assert_eq!(TimeSignature::INCOMPLETE.measure_length(), 0.0);
    }

    #[test]
    fn test_note_value_table() {
        assert_eq!(NoteValue::Whole.denominator(), 1);
        assert_eq!(NoteValue::Quarter.denominator(), 4);
        assert_eq!(NoteValue::ThousandTwentyFourth.denominator(), 1024);
        assert_eq!(NoteValue::from_denominator(16), Some(NoteValue::Sixteenth));
        assert_eq!(NoteValue::from_denominator(12), None);
        assert_eq!(NoteValue::from_glyph('Q'), Some(NoteValue::Quarter));
        assert_eq!(NoteValue::from_glyph('z'), None);

        // Glyphs must be unique for the grammar to round-trip
        let mut glyphs: Vec<char> = NoteValue::ALL.iter().map(|v| v.glyph()).collect();
        glyphs.sort();
        glyphs.dedup();
        assert_eq!(glyphs.len(), NoteValue::ALL.len());
    }

    #[test]
    fn test_note_duration_with_dots() {
        let note = RhythmNote::note(NoteValue::Quarter).dotted(1);
        assert_relative_eq!(note.duration(), 0.375);

        let double = RhythmNote::note(NoteValue::Half).dotted(2);
        assert_relative_eq!(double.duration(), 0.875);
    }

    #[test]
    fn test_malformed_note() {
        let note = RhythmNote::malformed("zz");
        assert!(note.is_malformed());
        assert_eq!(note.display(), "?");
        assert_eq!(note.duration(), 0.0);
    }

    #[test]
    fn test_display_case_encodes_emphasis() {
        assert_eq!(RhythmNote::accent(NoteValue::Eighth).display(), "E");
        assert_eq!(RhythmNote::note(NoteValue::Eighth).display(), "e");
    }

    #[test]
    fn test_tuplet_duration() {
        let triplet = RhythmTuplet::new(
            TupletRatio::triplet(),
            vec![RhythmNote::note(NoteValue::Eighth); 3],
        );
        // Three triplet eighths fill one quarter
        assert_relative_eq!(triplet.duration(), 0.25, epsilon = 1e-12);
        assert_eq!(RhythmElement::from(triplet).atom_count(), 3);
    }

    #[test]
    fn test_rhythm_total_length() {
        let rhythm = Rhythm::four_on_the_floor();
        assert_relative_eq!(rhythm.total_length(), 1.0);
        assert_eq!(rhythm.measures().len(), 1);
    }
}
