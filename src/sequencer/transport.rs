// Transport - Playback state and playhead position
// The playhead maps musical position (whole notes) to time since play-start

use super::timeline::RhythmTimeline;
use crate::rhythm::EPSILON;

/// Transport state
///
/// Pause is `Stopped` with a remembered playhead, not a state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped)
    }
}

/// Next beat the playhead would fire, computed against a timeline snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedBeat {
    /// Index into `RhythmTimeline::entries`
    pub entry: usize,
    /// Absolute musical position of the beat (whole notes since play-start)
    pub position: f64,
    /// Absolute position where the beat's cycle begins
    pub cycle_start: f64,
    pub cycle: u64,
    /// Scheduled time in ms since play-start
    pub time_ms: f64,
    pub duration_ms: f64,
}

/// Musical playhead
///
/// Position is tracked in absolute whole notes. Time is derived from a
/// (time, position) anchor and the current rate, so a tempo change only
/// moves the anchor and never the position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playhead {
    anchor_ms: f64,
    anchor_position: f64,
    ms_per_whole: f64,
    cycle_start: f64,
    cycle: u64,
    /// End of the last fired element; the next beat starts at or after it
    next_position: f64,
}

impl Playhead {
    pub fn new(ms_per_whole: f64) -> Self {
        Self {
            anchor_ms: 0.0,
            anchor_position: 0.0,
            ms_per_whole,
            cycle_start: 0.0,
            cycle: 0,
            next_position: 0.0,
        }
    }

    pub fn ms_per_whole(&self) -> f64 {
        self.ms_per_whole
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Position where the next beat may start
    pub fn next_position(&self) -> f64 {
        self.next_position
    }

    /// Position reached inside the current cycle
    pub fn cycle_offset(&self) -> f64 {
        self.next_position - self.cycle_start
    }

    /// Time (ms since play-start) at which `position` is reached
    pub fn time_of(&self, position: f64) -> f64 {
        self.anchor_ms + (position - self.anchor_position) * self.ms_per_whole
    }

    /// Musical position reached at `time_ms`
    pub fn position_at(&self, time_ms: f64) -> f64 {
        self.anchor_position + (time_ms - self.anchor_ms) / self.ms_per_whole
    }

    /// Change the rate at `now_ms` without moving the musical position
    pub fn retime(&mut self, now_ms: f64, ms_per_whole: f64) {
        self.anchor_position = self.position_at(now_ms);
        self.anchor_ms = now_ms;
        self.ms_per_whole = ms_per_whole;
    }

    /// Restart the clock at time zero from the remembered position (resume)
    pub fn rebase(&mut self, ms_per_whole: f64) {
        self.anchor_ms = 0.0;
        self.anchor_position = self.next_position;
        self.ms_per_whole = ms_per_whole;
    }

    /// Work out the next beat without moving the playhead
    pub fn plan(&self, timeline: &RhythmTimeline) -> Option<PlannedBeat> {
        let entries = timeline.entries();
        if entries.is_empty() || timeline.length() <= EPSILON {
            return None;
        }

        let (entry, cycle_start, cycle) =
            match timeline.first_at_or_after(self.cycle_offset(), EPSILON) {
                Some(entry) => (entry, self.cycle_start, self.cycle),
                // Past the end of this rhythm: open a new cycle here
                None => (0, self.next_position, self.cycle + 1),
            };

        let position = cycle_start + entries[entry].start;
        Some(PlannedBeat {
            entry,
            position,
            cycle_start,
            cycle,
            time_ms: self.time_of(position),
            duration_ms: entries[entry].duration * self.ms_per_whole,
        })
    }

    /// Move past every beat that starts before `now_ms`
    ///
    /// Used after a stall so the next planned beat is the one due now
    /// instead of a burst of overdue ones. Whole cycles are jumped in one
    /// step. Returns the number of beats skipped.
    pub fn skip_to(&mut self, now_ms: f64, timeline: &RhythmTimeline) -> u64 {
        let target = self.position_at(now_ms);
        let per_cycle = timeline.entries().len() as u64;
        let mut skipped = 0;
        let mut jumped = false;

        while let Some(planned) = self.plan(timeline) {
            if planned.position >= target - EPSILON {
                break;
            }

            if planned.cycle != self.cycle && !jumped {
                let full = ((target - self.next_position) / timeline.length()).floor() as u64;
                self.cycle += full;
                self.next_position += full as f64 * timeline.length();
                // Marks the cycle as finished so the next plan opens a new one
                self.cycle_start = self.next_position - timeline.length();
                skipped += full * per_cycle;
                jumped = true;
                continue;
            }

            self.advance(&planned, timeline);
            skipped += 1;
        }

        skipped
    }

    /// Commit a planned beat
    pub fn advance(&mut self, planned: &PlannedBeat, timeline: &RhythmTimeline) {
        let duration = timeline
            .entries()
            .get(planned.entry)
            .map(|entry| entry.duration)
            .unwrap_or(0.0);

        self.cycle_start = planned.cycle_start;
        self.cycle = planned.cycle;
        self.next_position = planned.position + duration;
    }
}
