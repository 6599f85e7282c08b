// Listener fan-out - Delivers scheduler events to independent observers
//
// Two registration styles coexist:
// - integer slots (same slot replaces, ascending slot order)
// - subscription handles (registration order, after all slots)

use super::scheduler::Beat;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Observer of a beat scheduler
pub trait BeatListener: Send + Sync {
    /// Called once per scheduled beat
    fn on_beat(&self, beat: &Beat);

    /// Called with `true` when playback stops or pauses, `false` when it starts
    fn on_pause_state_changed(&self, _paused: bool) {}
}

pub type UpdateCallback = Arc<dyn Fn(&Beat) + Send + Sync>;
pub type PauseCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Identifies a subscription made with `ListenerRegistry::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

#[derive(Default, Clone)]
struct Slot {
    update: Option<UpdateCallback>,
    pause: Option<PauseCallback>,
}

#[derive(Default)]
struct Registry {
    slots: BTreeMap<i32, Slot>,
    subscribers: Vec<(SubscriptionHandle, Arc<dyn BeatListener>)>,
    next_id: u64,
}

/// Ordered set of listeners
///
/// Dispatch works on a snapshot taken under the lock, so listeners may
/// register or unregister from inside a callback.
#[derive(Default)]
pub struct ListenerRegistry {
    inner: Mutex<Registry>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the beat callback of `slot`, replacing any previous one
    pub fn set_update_listener<F>(&self, slot: i32, callback: F)
    where
        F: Fn(&Beat) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        inner.slots.entry(slot).or_default().update = Some(Arc::new(callback));
    }

    /// Install the pause callback of `slot`, replacing any previous one
    pub fn set_pause_listener<F>(&self, slot: i32, callback: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        inner.slots.entry(slot).or_default().pause = Some(Arc::new(callback));
    }

    /// Remove both callbacks of `slot`
    pub fn clear_slot(&self, slot: i32) {
        self.inner.lock().slots.remove(&slot);
    }

    pub fn subscribe(&self, listener: Arc<dyn BeatListener>) -> SubscriptionHandle {
        let mut inner = self.inner.lock();
        let handle = SubscriptionHandle(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((handle, listener));
        handle
    }

    /// Returns false if the handle was not (or no longer) registered
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(h, _)| *h != handle);
        inner.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.slots.len() + inner.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dispatch_beat(&self, beat: &Beat) {
        let (updates, subscribers) = {
            let inner = self.inner.lock();
            let updates: Vec<UpdateCallback> = inner
                .slots
                .values()
                .filter_map(|slot| slot.update.clone())
                .collect();
            (updates, snapshot(&inner))
        };

        for update in updates {
            update(beat);
        }
        for listener in subscribers {
            listener.on_beat(beat);
        }
    }

    pub fn dispatch_pause(&self, paused: bool) {
        let (pauses, subscribers) = {
            let inner = self.inner.lock();
            let pauses: Vec<PauseCallback> = inner
                .slots
                .values()
                .filter_map(|slot| slot.pause.clone())
                .collect();
            (pauses, snapshot(&inner))
        };

        for pause in pauses {
            pause(paused);
        }
        for listener in subscribers {
            listener.on_pause_state_changed(paused);
        }
    }
}

fn snapshot(inner: &Registry) -> Vec<Arc<dyn BeatListener>> {
    inner
        .subscribers
        .iter()
        .map(|(_, listener)| Arc::clone(listener))
        .collect()
}
