// Rhythm Engine - Library exports for the binary, tests and benchmarks

pub mod command;
pub mod config;
pub mod messaging;
pub mod preset;
pub mod rhythm;
pub mod sequencer;
pub mod settings;
pub mod tempo;

// Re-export commonly used types for convenience
pub use command::{CommandManager, EditCommand, RhythmEditor};
pub use config::{ConfigError, EngineConfig};
pub use messaging::{ChannelListener, SchedulerEvent, create_event_channel};
pub use preset::{Preset, PresetError};
pub use rhythm::{
    Measure, NoteValue, Rhythm, RhythmNote, SimpleRhythm, TimeSignature, ValidationError,
    deserialize, serialize, validate,
};
pub use sequencer::{
    Beat, BeatListener, BeatScheduler, BeatValue, Metronome, MetronomeState, Tempo, TrackId,
    TransportState,
};
pub use settings::{MemorySettings, SettingsStore};
pub use tempo::{TempoClusterer, TempoMarkings};
