//! Selector-driven views over a store.
//!
//! A connection keeps the last value a selector produced and calls back only
//! when a new state yields a different value. This is the pull-state,
//! push-signal contract a UI layer needs to re-render on change.

use crate::store::Store;
use crate::subscriptions::Subscription;
use crate::types::Action;
use parking_lot::Mutex;
use std::sync::Arc;

/// A live projection of store state.
pub struct Connection<T> {
    subscription: Subscription,
    current: Arc<Mutex<T>>,
}

impl<T: Clone> Connection<T> {
    /// The most recent projection.
    pub fn current(&self) -> T {
        self.current.lock().clone()
    }

    /// Stop tracking the store. Later calls are no-ops.
    pub fn disconnect(&self) -> bool {
        self.subscription.unsubscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.is_active()
    }
}

/// Track `selector(state)` and call `on_change` whenever it changes.
///
/// The initial projection is computed immediately and does not trigger
/// `on_change`.
pub fn connect<S, A, T, F, C>(store: &Store<S, A>, selector: F, on_change: C) -> Connection<T>
where
    S: Send + Sync + 'static,
    A: Action,
    T: PartialEq + Clone + Send + 'static,
    F: Fn(&S) -> T + Send + Sync + 'static,
    C: Fn(&T) + Send + Sync + 'static,
{
    let current = Arc::new(Mutex::new(selector(&*store.get_state())));
    let weak = store.downgrade();
    let slot = Arc::clone(&current);

    let subscription = store.subscribe(move || {
        let state = match weak.get_state() {
            Some(state) => state,
            None => return,
        };

        let selected = selector(&*state);
        {
            let mut last = slot.lock();
            if *last == selected {
                return;
            }
            *last = selected.clone();
        }
        on_change(&selected);
    });

    Connection {
        subscription,
        current,
    }
}
