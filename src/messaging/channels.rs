// Lock-free event channel between timing threads and a polling consumer

use crate::messaging::event::SchedulerEvent;
use crate::sequencer::{Beat, BeatListener, TrackId};
use parking_lot::Mutex;
use ringbuf::traits::{Producer, Split};
use ringbuf::HeapRb;
use std::sync::atomic::{AtomicU64, Ordering};

pub type EventProducer = ringbuf::HeapProd<SchedulerEvent>;
pub type EventConsumer = ringbuf::HeapCons<SchedulerEvent>;

pub fn create_event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<SchedulerEvent>::new(capacity);
    rb.split()
}

/// Listener that pushes every event of one track into a ring buffer
///
/// Never blocks the timing thread: when the consumer falls behind the
/// newest event is dropped and counted.
pub struct ChannelListener {
    track: TrackId,
    producer: Mutex<EventProducer>,
    dropped: AtomicU64,
}

impl ChannelListener {
    pub fn new(track: TrackId, producer: EventProducer) -> Self {
        Self {
            track,
            producer: Mutex::new(producer),
            dropped: AtomicU64::new(0),
        }
    }

    /// Events lost because the buffer was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, event: SchedulerEvent) {
        if self.producer.lock().try_push(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl BeatListener for ChannelListener {
    fn on_beat(&self, beat: &Beat) {
        self.push(SchedulerEvent::Beat {
            track: self.track,
            beat: beat.clone(),
        });
    }

    fn on_pause_state_changed(&self, paused: bool) {
        self.push(SchedulerEvent::PauseChanged {
            track: self.track,
            paused,
        });
    }
}
