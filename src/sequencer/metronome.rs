// Metronome - Two beat schedulers (primary and secondary) sharing one tempo
// Owns preset export/import and persistence of both rhythms

use super::scheduler::{BeatScheduler, SchedulerError};
use super::timeline::BeatValue;
use crate::config::EngineConfig;
use crate::preset::Preset;
use crate::rhythm::{DurationError, Rhythm, SimpleRhythm};
use crate::settings::SettingsStore;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackId {
    Primary,
    Secondary,
}

impl TrackId {
    pub const ALL: [TrackId; 2] = [TrackId::Primary, TrackId::Secondary];

    /// Key under which the track's rhythm is persisted
    pub fn settings_key(self) -> &'static str {
        match self {
            TrackId::Primary => "primary_rhythm",
            TrackId::Secondary => "secondary_rhythm",
        }
    }

    fn index(self) -> usize {
        match self {
            TrackId::Primary => 0,
            TrackId::Secondary => 1,
        }
    }
}

/// Tempo settings shared by both tracks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetronomeState {
    pub bpm: u32,
    pub beat_value_primary: f32,
    pub beat_value_secondary: f32,
    pub secondary_enabled: bool,
}

impl Default for MetronomeState {
    fn default() -> Self {
        Self {
            bpm: 120,
            beat_value_primary: 4.0,
            beat_value_secondary: 4.0,
            secondary_enabled: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum MetronomeError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("Cannot build rhythm: {0}")]
    Duration(#[from] DurationError),

    #[error("Beat value must be a positive number, got {0}")]
    BeatValue(f32),
}

pub struct Metronome {
    config: EngineConfig,
    tracks: [BeatScheduler; 2],
    simple_rhythms: [Option<SimpleRhythm>; 2],
    secondary_enabled: bool,
}

impl Metronome {
    /// Build both tracks from `config`; an invalid config is replaced by
    /// the defaults
    pub fn new(config: EngineConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!(error = %e, "Invalid engine config, using defaults");
                EngineConfig::default()
            }
        };

        let tracks = [
            BeatScheduler::with_config("primary", config.scheduler.clone()),
            BeatScheduler::with_config("secondary", config.scheduler.clone()),
        ];

        let beat_value = BeatValue::new(config.default_beat_value).unwrap_or_default();
        for track in &tracks {
            track.set_bpm(config.clamp_bpm(config.default_bpm));
            track.set_beat_value(beat_value);
        }

        Self {
            config,
            tracks,
            simple_rhythms: [None, None],
            secondary_enabled: false,
        }
    }

    /// Scheduler of one track, e.g. to register listeners
    pub fn track(&self, id: TrackId) -> &BeatScheduler {
        &self.tracks[id.index()]
    }

    pub fn primary(&self) -> &BeatScheduler {
        self.track(TrackId::Primary)
    }

    pub fn secondary(&self) -> &BeatScheduler {
        self.track(TrackId::Secondary)
    }

    /// Start the primary track and, when enabled, the secondary one from
    /// the same instant
    pub fn start(&self) -> Result<(), MetronomeError> {
        let at = Instant::now();
        let primary_was_playing = self.primary().is_playing();
        self.primary().start_at(at)?;

        if self.secondary_enabled
            && let Err(e) = self.secondary().start_at(at)
        {
            // Leave earlier playback alone
            if !primary_was_playing {
                self.primary().stop();
            }
            return Err(e.into());
        }

        info!(
            bpm = self.bpm(),
            secondary = self.secondary_enabled,
            "Metronome started"
        );
        Ok(())
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
        info!("Metronome stopped");
    }

    pub fn pause(&self) {
        for track in &self.tracks {
            track.pause();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.primary().is_playing()
    }

    pub fn bpm(&self) -> u32 {
        self.primary().bpm()
    }

    /// Set the shared tempo, clamped to the configured range
    pub fn set_bpm(&self, bpm: u32) {
        let bpm = self.config.clamp_bpm(bpm);
        for track in &self.tracks {
            track.set_bpm(bpm);
        }
    }

    pub fn set_beat_value(&self, id: TrackId, beat_value: BeatValue) {
        self.track(id).set_beat_value(beat_value);
    }

    pub fn set_rhythm(&mut self, id: TrackId, rhythm: Rhythm) -> Result<(), MetronomeError> {
        self.track(id).set_rhythm(rhythm)?;
        self.simple_rhythms[id.index()] = None;
        Ok(())
    }

    /// Generate the track's rhythm from a simple description
    pub fn set_simple_rhythm(
        &mut self,
        id: TrackId,
        simple: SimpleRhythm,
    ) -> Result<(), MetronomeError> {
        let rhythm = simple.generate()?;
        self.track(id).set_rhythm(rhythm)?;
        self.simple_rhythms[id.index()] = Some(simple);
        Ok(())
    }

    pub fn simple_rhythm(&self, id: TrackId) -> Option<SimpleRhythm> {
        self.simple_rhythms[id.index()]
    }

    pub fn secondary_enabled(&self) -> bool {
        self.secondary_enabled
    }

    /// Toggle the secondary track; while playing it starts or stops at once
    pub fn set_secondary_enabled(&mut self, enabled: bool) -> Result<(), MetronomeError> {
        self.secondary_enabled = enabled;
        if !enabled {
            self.secondary().stop();
        } else if self.is_playing() {
            self.secondary().start()?;
        }
        Ok(())
    }

    pub fn state(&self) -> MetronomeState {
        MetronomeState {
            bpm: self.bpm(),
            beat_value_primary: self.primary().beat_value().value(),
            beat_value_secondary: self.secondary().beat_value().value(),
            secondary_enabled: self.secondary_enabled,
        }
    }

    pub fn apply_state(&mut self, state: &MetronomeState) -> Result<(), MetronomeError> {
        let primary = BeatValue::new(state.beat_value_primary)
            .ok_or(MetronomeError::BeatValue(state.beat_value_primary))?;
        let secondary = BeatValue::new(state.beat_value_secondary)
            .ok_or(MetronomeError::BeatValue(state.beat_value_secondary))?;

        self.set_bpm(state.bpm);
        self.set_beat_value(TrackId::Primary, primary);
        self.set_beat_value(TrackId::Secondary, secondary);
        self.set_secondary_enabled(state.secondary_enabled)
    }

    pub fn to_preset(&self, name: impl Into<String>) -> Preset {
        Preset::new(
            name,
            self.state(),
            &self.primary().rhythm(),
            &self.secondary().rhythm(),
        )
        .with_simple_rhythms(
            self.simple_rhythm(TrackId::Primary),
            self.simple_rhythm(TrackId::Secondary),
        )
    }

    /// Load rhythms and tempo settings from a preset
    ///
    /// Everything is checked before anything changes: on `Err` the
    /// metronome is exactly as it was.
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<(), MetronomeError> {
        let state = &preset.state;
        for value in [state.beat_value_primary, state.beat_value_secondary] {
            BeatValue::new(value).ok_or(MetronomeError::BeatValue(value))?;
        }

        let primary = preset.primary();
        let secondary = preset.secondary();
        let secondary_will_play =
            self.secondary().is_playing() || (self.is_playing() && state.secondary_enabled);
        let checks = [
            (&primary, self.is_playing()),
            (&secondary, secondary_will_play),
        ];
        for (rhythm, playing) in checks {
            let errors = rhythm.validate();
            if playing && !errors.is_empty() {
                return Err(SchedulerError::InvalidRhythm(errors).into());
            }
        }

        self.set_rhythm(TrackId::Primary, primary)?;
        self.set_rhythm(TrackId::Secondary, secondary)?;
        self.simple_rhythms = [preset.primary_simple_rhythm, preset.secondary_simple_rhythm];
        self.apply_state(state)?;

        debug!(preset = %preset.name, "Preset applied");
        Ok(())
    }

    pub fn save(&self, store: &mut dyn SettingsStore) {
        for id in TrackId::ALL {
            store.save_rhythm(id.settings_key(), &self.track(id).rhythm());
        }
    }

    /// Restore both rhythms; missing keys leave the track untouched
    pub fn restore(&mut self, store: &dyn SettingsStore) -> Result<(), MetronomeError> {
        for id in TrackId::ALL {
            if let Some(rhythm) = store.load_rhythm(id.settings_key()) {
                self.set_rhythm(id, rhythm)?;
            }
        }
        Ok(())
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
