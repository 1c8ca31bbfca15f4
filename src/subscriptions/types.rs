//! Subscription types for store change notifications.

use crate::types::{ListenerId, StoreVersion};
use serde::{Deserialize, Serialize};
use std::sync::Weak;

use super::manager::ListenerRegistry;

/// Events delivered to channel subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A dispatch committed a new state.
    StateChanged {
        action_type: String,
        version: StoreVersion,
    },

    /// The active reducer was swapped. Followed by the `@@INIT` dispatch.
    ReducerReplaced { version: StoreVersion },

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why a channel subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Receiver was dropped.
    Disconnected,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Capability returned by `subscribe`.
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Clone, Debug)]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, registry: Weak<ListenerRegistry>) -> Self {
        Self { id, registry }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener. Later calls are no-ops.
    ///
    /// Returns true if this call removed it.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id),
            None => false,
        }
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.contains(self.id))
            .unwrap_or(false)
    }
}

/// A subscription that receives [`StoreEvent`]s over a bounded channel.
pub struct ChannelSubscription {
    subscription: Subscription,
    receiver: crossbeam_channel::Receiver<StoreEvent>,
}

impl ChannelSubscription {
    pub(crate) fn new(
        subscription: Subscription,
        receiver: crossbeam_channel::Receiver<StoreEvent>,
    ) -> Self {
        Self {
            subscription,
            receiver,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.subscription.id()
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn unsubscribe(&self) -> bool {
        self.subscription.unsubscribe()
    }

    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StoreEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StoreEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StoreEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently buffered.
    pub fn drain(&self) -> Vec<StoreEvent> {
        self.receiver.try_iter().collect()
    }
}
