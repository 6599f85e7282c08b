// Beat scheduler - Real-time beat clock for one rhythm track
// Each instance owns one timing thread; listeners run on that thread

use super::listener::{BeatListener, ListenerRegistry, SubscriptionHandle};
use super::timeline::{BeatValue, RhythmTimeline, Tempo, TimelineEntry, Timing};
use super::transport::{PlannedBeat, Playhead, TransportState};
use crate::config::SchedulerConfig;
use crate::rhythm::{NoteKind, Rhythm, ValidationError};
use parking_lot::{Condvar, Mutex, MutexGuard, ReentrantMutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// One scheduled beat, delivered to listeners when it is due
#[derive(Debug, Clone, PartialEq)]
pub struct Beat {
    pub measure_index: usize,
    /// Position among the beats of the measure (tuplet notes count individually)
    pub beat_index_within_measure: usize,
    pub element_index: usize,
    /// Index inside the tuplet when the beat belongs to one
    pub tuplet_note: Option<usize>,
    /// Scheduled offset from play-start
    pub timestamp_offset_ms: i64,
    pub is_emphasized: bool,
    pub kind: NoteKind,
    pub duration_ms: f64,
    /// Number of completed passes over the rhythm
    pub cycle: u64,
}

impl Beat {
    fn new(entry: &TimelineEntry, planned: &PlannedBeat) -> Self {
        Self {
            measure_index: entry.measure,
            beat_index_within_measure: entry.beat_in_measure,
            element_index: entry.element,
            tuplet_note: entry.tuplet_note,
            timestamp_offset_ms: planned.time_ms.round() as i64,
            is_emphasized: entry.emphasized,
            kind: entry.kind,
            duration_ms: planned.duration_ms,
            cycle: planned.cycle,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.kind.is_rest()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Rhythm is not playable ({} error(s))", .0.len())]
    InvalidRhythm(Vec<ValidationError>),

    #[error("Failed to spawn timing thread: {0}")]
    Spawn(#[from] std::io::Error),
}

struct Run {
    started_at: Instant,
    generation: u64,
    playhead: Playhead,
    /// Playhead before the beat that is planned but not yet dispatched
    undispatched: Option<Playhead>,
}

struct State {
    rhythm: Rhythm,
    timeline: RhythmTimeline,
    timing: Timing,
    run: Option<Run>,
    /// Playhead remembered by `pause`
    paused: Option<Playhead>,
    shutdown: bool,
}

struct Shared {
    label: String,
    config: SchedulerConfig,
    state: Mutex<State>,
    wake: Condvar,
    /// Held while beats are dispatched and while start/stop change the
    /// generation. Lock order: gate, then state.
    gate: ReentrantMutex<()>,
    generation: AtomicU64,
    listeners: ListenerRegistry,
}

/// Real-time scheduler for one rhythm
///
/// Position is kept as a musical playhead, so rhythm, BPM and beat value
/// can all change during playback and take effect from the next beat.
/// A generation counter, bumped by every start/stop, makes beats computed
/// for a previous run no-ops.
pub struct BeatScheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BeatScheduler {
    pub fn new() -> Self {
        Self::with_config("track", SchedulerConfig::default())
    }

    pub fn with_config(label: impl Into<String>, config: SchedulerConfig) -> Self {
        let rhythm = Rhythm::four_on_the_floor();
        let state = State {
            timeline: RhythmTimeline::new(&rhythm),
            rhythm,
            timing: Timing::default(),
            run: None,
            paused: None,
            shutdown: false,
        };

        Self {
            shared: Arc::new(Shared {
                label: label.into(),
                config,
                state: Mutex::new(state),
                wake: Condvar::new(),
                gate: ReentrantMutex::new(()),
                generation: AtomicU64::new(0),
                listeners: ListenerRegistry::new(),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Start playback now. No-op if already playing.
    pub fn start(&self) -> Result<(), SchedulerError> {
        self.start_at(Instant::now())
    }

    /// Start playback with beat offsets measured from `at`
    ///
    /// Resumes from the remembered position after `pause`.
    pub fn start_at(&self, at: Instant) -> Result<(), SchedulerError> {
        let _gate = self.shared.gate.lock();
        {
            let mut state = self.shared.state.lock();
            if state.run.is_some() {
                return Ok(());
            }

            let errors = state.rhythm.validate();
            if !errors.is_empty() {
                warn!(
                    scheduler = %self.shared.label,
                    errors = errors.len(),
                    "Refusing to start: rhythm is not playable"
                );
                return Err(SchedulerError::InvalidRhythm(errors));
            }

            self.ensure_worker()?;

            let ms_per_whole = state.timing.ms_per_whole_note();
            let playhead = match state.paused.take() {
                Some(mut playhead) => {
                    playhead.rebase(ms_per_whole);
                    playhead
                }
                None => Playhead::new(ms_per_whole),
            };
            let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.run = Some(Run {
                started_at: at,
                generation,
                playhead,
                undispatched: None,
            });

            debug!(
                scheduler = %self.shared.label,
                generation,
                bpm = state.timing.tempo.bpm(),
                "Playback started"
            );
        }

        self.shared.wake.notify_all();
        self.shared.listeners.dispatch_pause(false);
        Ok(())
    }

    /// Stop playback and reset to the start of the rhythm
    pub fn stop(&self) {
        self.halt(false);
    }

    /// Stop playback, keeping the position for the next `start`
    pub fn pause(&self) {
        self.halt(true);
    }

    fn halt(&self, keep_position: bool) {
        let _gate = self.shared.gate.lock();
        let was_playing = {
            let mut state = self.shared.state.lock();
            let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let run = state.run.take();
            let was_playing = run.is_some();

            state.paused = match (keep_position, run) {
                // A beat that never reached listeners plays after resume
                (true, Some(run)) => Some(run.undispatched.unwrap_or(run.playhead)),
                (true, None) => state.paused.take(),
                (false, _) => None,
            };

            if was_playing {
                debug!(
                    scheduler = %self.shared.label,
                    generation,
                    paused = keep_position,
                    "Playback stopped"
                );
            }
            was_playing
        };

        self.shared.wake.notify_all();
        if was_playing {
            self.shared.listeners.dispatch_pause(true);
        }
    }

    /// Replace the rhythm
    ///
    /// While playing, an unplayable rhythm is rejected and playback keeps
    /// the previous one. While stopped anything is accepted and `start`
    /// reports the problems.
    pub fn set_rhythm(&self, rhythm: Rhythm) -> Result<(), SchedulerError> {
        {
            let mut state = self.shared.state.lock();
            if state.run.is_some() {
                let errors = rhythm.validate();
                if !errors.is_empty() {
                    warn!(
                        scheduler = %self.shared.label,
                        errors = errors.len(),
                        "Ignoring unplayable rhythm during playback"
                    );
                    return Err(SchedulerError::InvalidRhythm(errors));
                }
            }

            state.timeline = RhythmTimeline::new(&rhythm);
            state.rhythm = rhythm;
            debug!(scheduler = %self.shared.label, rhythm = %state.rhythm, "Rhythm replaced");
        }

        self.shared.wake.notify_all();
        Ok(())
    }

    /// Set the tempo (clamped to 1..=500 BPM)
    pub fn set_bpm(&self, bpm: u32) {
        self.update_timing(|timing| timing.tempo = Tempo::new(bpm));
    }

    pub fn set_beat_value(&self, beat_value: BeatValue) {
        self.update_timing(|timing| timing.beat_value = beat_value);
    }

    fn update_timing(&self, change: impl FnOnce(&mut Timing)) {
        {
            let mut state = self.shared.state.lock();
            let mut timing = state.timing;
            change(&mut timing);
            if timing == state.timing {
                return;
            }
            state.timing = timing;

            if let Some(run) = state.run.as_mut() {
                let now_ms = elapsed_ms(run.started_at, Instant::now());
                run.playhead.retime(now_ms, timing.ms_per_whole_note());
            }
            debug!(
                scheduler = %self.shared.label,
                bpm = timing.tempo.bpm(),
                beat_value = timing.beat_value.value(),
                "Timing changed"
            );
        }
        self.shared.wake.notify_all();
    }

    pub fn transport_state(&self) -> TransportState {
        if self.shared.state.lock().run.is_some() {
            TransportState::Playing
        } else {
            TransportState::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.transport_state().is_playing()
    }

    /// Stopped with a remembered position
    pub fn is_paused(&self) -> bool {
        let state = self.shared.state.lock();
        state.run.is_none() && state.paused.is_some()
    }

    pub fn rhythm(&self) -> Rhythm {
        self.shared.state.lock().rhythm.clone()
    }

    pub fn timing(&self) -> Timing {
        self.shared.state.lock().timing
    }

    pub fn bpm(&self) -> u32 {
        self.timing().tempo.bpm()
    }

    pub fn beat_value(&self) -> BeatValue {
        self.timing().beat_value
    }

    /// Current generation; changes on every start and stop
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    pub fn set_update_listener<F>(&self, slot: i32, callback: F)
    where
        F: Fn(&Beat) + Send + Sync + 'static,
    {
        self.shared.listeners.set_update_listener(slot, callback);
    }

    pub fn set_pause_listener<F>(&self, slot: i32, callback: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared.listeners.set_pause_listener(slot, callback);
    }

    pub fn clear_slot(&self, slot: i32) {
        self.shared.listeners.clear_slot(slot);
    }

    pub fn subscribe(&self, listener: Arc<dyn BeatListener>) -> SubscriptionHandle {
        self.shared.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.shared.listeners.unsubscribe(handle)
    }

    fn ensure_worker(&self) -> Result<(), SchedulerError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(format!(
                "{}-{}",
                self.shared.config.thread_name_prefix, self.shared.label
            ))
            .spawn(move || run_worker(shared))?;
        *worker = Some(handle);
        Ok(())
    }
}

impl Default for BeatScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BeatScheduler {
    fn drop(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.state.lock().shutdown = true;
        self.shared.wake.notify_all();

        if let Some(handle) = self.worker.get_mut().take() {
            // Dropped from one of our own callbacks: the loop exits by itself
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

fn elapsed_ms(started_at: Instant, now: Instant) -> f64 {
    now.saturating_duration_since(started_at).as_secs_f64() * 1000.0
}

fn run_worker(shared: Arc<Shared>) {
    let mut state = shared.state.lock();

    loop {
        if state.shutdown {
            break;
        }

        let Some(run) = state.run.as_ref() else {
            shared.wake.wait(&mut state);
            continue;
        };
        let started_at = run.started_at;
        let generation = run.generation;
        let Some(planned) = run.playhead.plan(&state.timeline) else {
            shared.wake.wait(&mut state);
            continue;
        };

        let due = started_at + Duration::from_secs_f64(planned.time_ms.max(0.0) / 1000.0);
        let now = Instant::now();
        if now < due {
            // Any wake-up re-plans from the current rhythm and timing
            shared.wake.wait_until(&mut state, due);
            continue;
        }

        // Past its whole duration: skip to the beat due now
        let late_ms = elapsed_ms(due, now);
        if late_ms > planned.duration_ms.max(shared.config.late_warning_ms) {
            let skipped = {
                let State { timeline, run, .. } = &mut *state;
                match run.as_mut() {
                    Some(run) => run.playhead.skip_to(elapsed_ms(started_at, now), timeline),
                    None => 0,
                }
            };
            if skipped > 0 {
                warn!(scheduler = %shared.label, skipped, late_ms, "Skipped overdue beats");
                continue;
            }
        }

        let beat = {
            let State { timeline, run, .. } = &mut *state;
            let Some(run) = run.as_mut() else {
                continue;
            };
            let before = run.playhead;
            run.playhead.advance(&planned, timeline);
            run.undispatched = Some(before);
            Beat::new(&timeline.entries()[planned.entry], &planned)
        };

        MutexGuard::unlocked(&mut state, || {
            shared.dispatch(generation, &beat, due);
        });
    }

    trace!(scheduler = %shared.label, "Timing thread exited");
}

impl Shared {
    fn dispatch(&self, generation: u64, beat: &Beat, due: Instant) {
        let _gate = self.gate.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            trace!(scheduler = %self.label, generation, "Dropping beat from a stale run");
            return;
        }
        if let Some(run) = self.state.lock().run.as_mut() {
            run.undispatched = None;
        }

        let late_ms = elapsed_ms(due, Instant::now());
        if late_ms > self.config.late_warning_ms {
            warn!(
                scheduler = %self.label,
                late_ms,
                measure = beat.measure_index,
                beat = beat.beat_index_within_measure,
                "Beat fired late"
            );
        }

        self.listeners.dispatch_beat(beat);
    }
}
