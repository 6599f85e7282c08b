// Preset types - Shareable snapshot of a two-track metronome setup

use crate::rhythm::{Rhythm, SimpleRhythm, deserialize, serialize};
use crate::sequencer::MetronomeState;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Complete playback configuration
///
/// Rhythms are stored in their text notation so presets stay readable and
/// survive model changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    /// Creation time, Unix milliseconds
    pub timestamp: i64,
    pub state: MetronomeState,
    pub primary_rhythm: String,
    pub secondary_rhythm: String,
    #[serde(default)]
    pub primary_simple_rhythm: Option<SimpleRhythm>,
    #[serde(default)]
    pub secondary_simple_rhythm: Option<SimpleRhythm>,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        state: MetronomeState,
        primary: &Rhythm,
        secondary: &Rhythm,
    ) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now().timestamp_millis(),
            state,
            primary_rhythm: serialize(primary),
            secondary_rhythm: serialize(secondary),
            primary_simple_rhythm: None,
            secondary_simple_rhythm: None,
        }
    }

    pub fn with_simple_rhythms(
        mut self,
        primary: Option<SimpleRhythm>,
        secondary: Option<SimpleRhythm>,
    ) -> Self {
        self.primary_simple_rhythm = primary;
        self.secondary_simple_rhythm = secondary;
        self
    }

    pub fn primary(&self) -> Rhythm {
        deserialize(&self.primary_rhythm)
    }

    pub fn secondary(&self) -> Rhythm {
        deserialize(&self.secondary_rhythm)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}
