// Timeline - Musical time representation
// Handles conversion between rhythm positions (whole notes) and wall-clock time

use crate::rhythm::{NoteKind, Rhythm, RhythmElement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tempo in BPM (Beats Per Minute), always within `MIN..=MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tempo {
    bpm: u32,
}

impl Tempo {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 500;

    /// Creates a new tempo, clamped into `MIN..=MAX`
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm: bpm.clamp(Self::MIN, Self::MAX),
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Duration of one beat in milliseconds
    pub fn beat_duration_ms(&self) -> f64 {
        60_000.0 / self.bpm as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.bpm)
    }
}

/// Note value that one tempo beat represents, as a reciprocal of its length
///
/// Quarter note = 4, eighth = 8, dotted quarter = 4 × 2/3.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeatValue(f32);

impl BeatValue {
    /// Rejects non-finite and non-positive values
    pub fn new(value: f32) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    /// Plain note value (4 = quarter)
    pub fn note(denominator: u32) -> Self {
        Self(denominator.max(1) as f32)
    }

    /// Dotted note value (dotted quarter = 8/3)
    pub fn dotted(denominator: u32) -> Self {
        Self(denominator.max(1) as f32 * 2.0 / 3.0)
    }

    pub fn quarter() -> Self {
        Self::note(4)
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// Length of one beat in whole notes
    pub fn beat_length(&self) -> f64 {
        1.0 / self.0 as f64
    }
}

impl Default for BeatValue {
    fn default() -> Self {
        Self::quarter()
    }
}

/// Tempo + beat value: everything needed to turn note lengths into time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timing {
    pub tempo: Tempo,
    pub beat_value: BeatValue,
}

impl Timing {
    pub fn new(tempo: Tempo, beat_value: BeatValue) -> Self {
        Self { tempo, beat_value }
    }

    /// Milliseconds taken by one whole note
    ///
    /// `duration × beatValue × 60000 / bpm`, so a beat-value note lasts
    /// exactly one tempo beat whatever the time signature.
    pub fn ms_per_whole_note(&self) -> f64 {
        self.beat_value.value() as f64 * self.tempo.beat_duration_ms()
    }

    /// Wall-clock length of a duration in whole notes
    pub fn duration_ms(&self, duration: f64) -> f64 {
        duration * self.ms_per_whole_note()
    }
}

/// One playable atom of a rhythm with its position in the cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEntry {
    /// Offset from the start of the rhythm, in whole notes
    pub start: f64,
    /// Effective length (dots and tuplet applied)
    pub duration: f64,
    pub measure: usize,
    /// Index among the beats of the measure, tuplet notes counted individually
    pub beat_in_measure: usize,
    /// Index of the top-level element
    pub element: usize,
    pub tuplet_note: Option<usize>,
    pub kind: NoteKind,
    pub emphasized: bool,
}

/// Flattened, positioned view of a rhythm used for elapsed-time lookups
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RhythmTimeline {
    entries: Vec<TimelineEntry>,
    length: f64,
}

impl RhythmTimeline {
    pub fn new(rhythm: &Rhythm) -> Self {
        let mut entries = Vec::new();
        let mut position = 0.0;

        for (measure_index, measure) in rhythm.measures.iter().enumerate() {
            let mut beat_in_measure = 0;
            for (element_index, element) in measure.elements.iter().enumerate() {
                match element {
                    RhythmElement::Note(note) => {
                        let duration = note.duration();
                        entries.push(TimelineEntry {
                            start: position,
                            duration,
                            measure: measure_index,
                            beat_in_measure,
                            element: element_index,
                            tuplet_note: None,
                            kind: note.kind,
                            emphasized: note.emphasized,
                        });
                        position += duration;
                        beat_in_measure += 1;
                    }
                    RhythmElement::Tuplet(tuplet) => {
                        for (inner, note) in tuplet.notes.iter().enumerate() {
                            let duration = tuplet.note_duration(note);
                            entries.push(TimelineEntry {
                                start: position,
                                duration,
                                measure: measure_index,
                                beat_in_measure,
                                element: element_index,
                                tuplet_note: Some(inner),
                                kind: note.kind,
                                emphasized: note.emphasized,
                            });
                            position += duration;
                            beat_in_measure += 1;
                        }
                    }
                }
            }
        }

        Self {
            entries,
            length: position,
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of one cycle in whole notes
    pub fn length(&self) -> f64 {
        self.length
    }

    /// First entry starting at or after `offset` (within `tolerance`)
    pub fn first_at_or_after(&self, offset: f64, tolerance: f64) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.start >= offset - tolerance)
    }

    /// Entry sounding at `offset` within one cycle
    pub fn entry_at(&self, offset: f64) -> Option<&TimelineEntry> {
        if self.length <= 0.0 {
            return None;
        }
        let offset = offset.rem_euclid(self.length);
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.start <= offset)
    }

    /// Scheduled offsets of one cycle in milliseconds
    pub fn offsets_ms(&self, timing: &Timing) -> Vec<f64> {
        self.entries
            .iter()
            .map(|entry| timing.duration_ms(entry.start))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhythm::deserialize;
    use approx::assert_relative_eq;

    #[test]
    fn test_tempo_clamps() {
        assert_eq!(Tempo::new(0).bpm(), 1);
        assert_eq!(Tempo::new(900).bpm(), 500);
        assert_eq!(Tempo::new(120).beat_duration_ms(), 500.0);
        assert_eq!(Tempo::default().to_string(), "120 BPM");
    }

    #[test]
    fn test_beat_value() {
        assert_eq!(BeatValue::quarter().value(), 4.0);
        assert_relative_eq!(BeatValue::dotted(4).beat_length(), 0.375, epsilon = 1e-6);
        assert!(BeatValue::new(0.0).is_none());
        assert!(BeatValue::new(f32::NAN).is_none());
        assert!(BeatValue::new(8.0).is_some());
    }

    #[test]
    fn test_quarter_at_120() {
        let timing = Timing::new(Tempo::new(120), BeatValue::quarter());
        assert_relative_eq!(timing.duration_ms(0.25), 500.0);
        assert_relative_eq!(timing.ms_per_whole_note(), 2000.0);
    }

    #[test]
    fn test_dotted_quarter_beat() {
        // 6/8 at 60 BPM with a dotted-quarter beat: each dotted quarter lasts 1s
        let timing = Timing::new(Tempo::new(60), BeatValue::dotted(4));
        assert_relative_eq!(timing.duration_ms(0.375), 1000.0, epsilon = 1e-3);
        assert_relative_eq!(timing.duration_ms(0.125), 333.333, epsilon = 1e-2);
    }

    #[test]
    fn test_timeline_offsets() {
        let rhythm = deserialize("{4/4}Q;q;q;q;");
        let timeline = RhythmTimeline::new(&rhythm);
        let timing = Timing::new(Tempo::new(120), BeatValue::quarter());

        assert_eq!(timeline.offsets_ms(&timing), vec![0.0, 500.0, 1000.0, 1500.0]);
        assert_relative_eq!(timeline.length(), 1.0);
        assert!(timeline.entries()[0].emphasized);
    }

    #[test]
    fn test_timeline_indices_with_tuplets() {
        let rhythm = deserialize("{2/4}[3:2](e;e;e);q;{1/4}-q;");
        let timeline = RhythmTimeline::new(&rhythm);
        let entries = timeline.entries();

        assert_eq!(entries.len(), 5);
        assert_eq!(entries[2].tuplet_note, Some(2));
        assert_eq!(entries[3].element, 1);
        assert_eq!(entries[3].beat_in_measure, 3);
        assert_relative_eq!(entries[3].start, 0.25, epsilon = 1e-12);
        assert_eq!(entries[4].measure, 1);
        assert_eq!(entries[4].beat_in_measure, 0);
        assert_eq!(entries[4].kind, NoteKind::Rest);
    }

    #[test]
    fn test_timeline_lookup() {
        let timeline = RhythmTimeline::new(&deserialize("{3/4}h;q;"));

        assert_eq!(timeline.first_at_or_after(0.0, 1e-6), Some(0));
        assert_eq!(timeline.first_at_or_after(0.1, 1e-6), Some(1));
        assert_eq!(timeline.first_at_or_after(0.5, 1e-6), Some(1));
        assert_eq!(timeline.first_at_or_after(0.6, 1e-6), None);

        assert_eq!(timeline.entry_at(0.3).map(|e| e.element), Some(0));
        assert_eq!(timeline.entry_at(0.6).map(|e| e.element), Some(1));
        // Wraps into the next cycle
        assert_eq!(timeline.entry_at(0.8).map(|e| e.element), Some(0));
    }
}
