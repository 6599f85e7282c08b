// Tempo markings - Named BPM ranges (Largo, Allegro, ...)

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoMarking {
    pub name: String,
    pub range: RangeInclusive<u32>,
}

impl TempoMarking {
    pub fn new(name: impl Into<String>, range: RangeInclusive<u32>) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    pub fn contains(&self, bpm: u32) -> bool {
        self.range.contains(&bpm)
    }
}

/// User-editable list of markings
///
/// Ranges may overlap; `lookup` returns the first match in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempoMarkings {
    markings: Vec<TempoMarking>,
}

impl TempoMarkings {
    pub fn new(markings: Vec<TempoMarking>) -> Self {
        Self { markings }
    }

    pub fn lookup(&self, bpm: u32) -> Option<&TempoMarking> {
        self.markings.iter().find(|marking| marking.contains(bpm))
    }

    pub fn all_matching(&self, bpm: u32) -> Vec<&TempoMarking> {
        self.markings
            .iter()
            .filter(|marking| marking.contains(bpm))
            .collect()
    }

    pub fn push(&mut self, marking: TempoMarking) {
        self.markings.push(marking);
    }

    /// Remove every marking called `name`; returns how many were removed
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.markings.len();
        self.markings.retain(|marking| marking.name != name);
        before - self.markings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TempoMarking> {
        self.markings.iter()
    }

    pub fn len(&self) -> usize {
        self.markings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markings.is_empty()
    }
}

impl Default for TempoMarkings {
    fn default() -> Self {
        Self::new(vec![
            TempoMarking::new("Larghissimo", 1..=24),
            TempoMarking::new("Grave", 25..=45),
            TempoMarking::new("Largo", 40..=60),
            TempoMarking::new("Lento", 45..=60),
            TempoMarking::new("Larghetto", 60..=66),
            TempoMarking::new("Adagio", 66..=76),
            TempoMarking::new("Adagietto", 72..=76),
            TempoMarking::new("Andante", 76..=108),
            TempoMarking::new("Andantino", 80..=108),
            TempoMarking::new("Moderato", 108..=120),
            TempoMarking::new("Allegretto", 112..=120),
            TempoMarking::new("Allegro", 120..=156),
            TempoMarking::new("Vivace", 156..=176),
            TempoMarking::new("Vivacissimo", 172..=176),
            TempoMarking::new("Presto", 168..=200),
            TempoMarking::new("Prestissimo", 200..=500),
        ])
    }
}
