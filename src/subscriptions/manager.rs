//! Listener registry and change fan-out.

use crate::types::ListenerId;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use super::types::{DropReason, StoreEvent, Subscription};

/// Zero-argument change callback.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
enum Sink {
    Callback(Listener),
    Channel(Sender<StoreEvent>),
}

struct Entry {
    id: ListenerId,
    sink: Sink,
}

/// Ordered list of listeners owned by a store.
///
/// Callbacks and channel subscribers share one registration order. The list
/// lock is never held while a callback runs, so callbacks may subscribe,
/// unsubscribe or dispatch.
pub struct ListenerRegistry {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn push(&self, sink: Sink) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.entries.lock().push(Entry { id, sink });
        id
    }

    /// Register a callback at the end of the list.
    pub fn subscribe(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.push(Sink::Callback(listener));
        Subscription::new(id, Arc::downgrade(self))
    }

    /// Register a bounded channel at the end of the list.
    pub fn subscribe_channel(
        self: &Arc<Self>,
        buffer_size: usize,
    ) -> (Subscription, Receiver<StoreEvent>) {
        // A zero-capacity channel is a rendezvous and every try_send would fail.
        let (sender, receiver) = bounded(buffer_size.max(1));
        let id = self.push(Sink::Channel(sender));
        (Subscription::new(id, Arc::downgrade(self)), receiver)
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = {
            let mut entries = self.entries.lock();
            match entries.iter().position(|e| e.id == id) {
                Some(index) => Some(entries.remove(index)),
                None => None,
            }
        };

        match removed {
            Some(entry) => {
                if let Sink::Channel(sender) = entry.sink {
                    // Best effort; the receiver may already be gone.
                    let _ = sender.try_send(StoreEvent::Dropped {
                        reason: DropReason::Unsubscribed,
                    });
                }
                trace!(listener = id.0, "Listener removed");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.lock().iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Deliver `event` to every channel, then run every callback, each in
    /// registration order.
    ///
    /// Channels are fed before any callback runs so that a callback which
    /// dispatches again cannot get its event into a channel ahead of this
    /// one. Callbacks iterate a snapshot taken on entry: listeners added
    /// during the loop wait for the next change, listeners removed during it
    /// still run once.
    pub fn notify(&self, event: &StoreEvent) {
        let snapshot = self.snapshot();
        trace!(listeners = snapshot.len(), "Notifying listeners");

        let mut to_remove = Vec::new();
        for (id, sink) in &snapshot {
            if let Sink::Channel(sender) = sink {
                if let Some(reason) = Self::try_deliver(sender, event.clone()) {
                    to_remove.push((*id, sender.clone(), reason));
                }
            }
        }
        self.drop_channels(to_remove);

        for (_, sink) in snapshot {
            if let Sink::Callback(listener) = sink {
                listener();
            }
        }
    }

    /// Deliver `event` to channel subscribers only.
    pub fn announce(&self, event: &StoreEvent) {
        let mut to_remove = Vec::new();
        for (id, sink) in self.snapshot() {
            if let Sink::Channel(sender) = sink {
                if let Some(reason) = Self::try_deliver(&sender, event.clone()) {
                    to_remove.push((id, sender, reason));
                }
            }
        }

        self.drop_channels(to_remove);
    }

    fn snapshot(&self) -> Vec<(ListenerId, Sink)> {
        self.entries
            .lock()
            .iter()
            .map(|e| (e.id, e.sink.clone()))
            .collect()
    }

    fn try_deliver(sender: &Sender<StoreEvent>, event: StoreEvent) -> Option<DropReason> {
        match sender.try_send(event) {
            Ok(()) => None,
            Err(crossbeam_channel::TrySendError::Full(_)) => Some(DropReason::BufferOverflow),
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                Some(DropReason::Disconnected)
            }
        }
    }

    fn drop_channels(&self, dropped: Vec<(ListenerId, Sender<StoreEvent>, DropReason)>) {
        if dropped.is_empty() {
            return;
        }

        let mut entries = self.entries.lock();
        for (id, sender, reason) in dropped {
            entries.retain(|e| e.id != id);
            debug!(listener = id.0, ?reason, "Dropping channel subscriber");
            // Might fail for the same reason it was dropped, that's ok.
            let _ = sender.try_send(StoreEvent::Dropped { reason });
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
