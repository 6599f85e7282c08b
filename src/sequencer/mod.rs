// Sequencer module - Musical time, beat scheduling and the two-track metronome

pub mod listener;
pub mod metronome;
pub mod scheduler;
pub mod timeline;
pub mod transport;

pub use listener::{BeatListener, ListenerRegistry, SubscriptionHandle};
pub use metronome::{Metronome, MetronomeError, MetronomeState, TrackId};
pub use scheduler::{Beat, BeatScheduler, SchedulerError};
pub use timeline::{BeatValue, RhythmTimeline, Tempo, TimelineEntry, Timing};
pub use transport::{PlannedBeat, Playhead, TransportState};
