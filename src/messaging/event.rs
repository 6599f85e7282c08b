// Scheduler events forwarded to pollers (UI thread, widgets)

use crate::sequencer::{Beat, TrackId};

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    Beat { track: TrackId, beat: Beat },
    PauseChanged { track: TrackId, paused: bool },
}

impl SchedulerEvent {
    pub fn track(&self) -> TrackId {
        match self {
            SchedulerEvent::Beat { track, .. } | SchedulerEvent::PauseChanged { track, .. } => {
                *track
            }
        }
    }
}
