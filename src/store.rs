//! The state container.

use crate::error::{Result, StoreError};
use crate::reducer::Reducer;
use crate::subscriptions::{ChannelSubscription, ListenerRegistry, StoreEvent, Subscription};
use crate::types::{Action, StoreVersion};
use parking_lot::{ReentrantMutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Name attached to log events from this store.
    pub label: String,

    /// Buffer size for channel subscriptions. Zero is treated as one.
    /// Default: 1000
    pub channel_buffer_size: usize,

    /// Log dispatches that left the state unchanged at debug level
    /// instead of trace.
    pub log_skipped: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "store".to_string(),
            channel_buffer_size: 1000,
            log_skipped: false,
        }
    }
}

/// The dispatch capability as a trait object.
pub type DispatchFn<A> = dyn Fn(A) -> Result<A> + Send + Sync;

/// Shared dispatch function. Middleware composition produces one of these.
pub type Dispatch<A> = Arc<DispatchFn<A>>;

/// State slot, reducer and listeners shared by every handle to one store.
struct Core<S, A> {
    config: StoreConfig,
    state: RwLock<Arc<S>>,
    reducer: RwLock<Arc<dyn Reducer<S, A>>>,
    listeners: Arc<ListenerRegistry>,
    version: AtomicU64,
    /// Serializes dispatches across threads; re-entrant so a listener can
    /// dispatch on the same thread.
    dispatch_lock: ReentrantMutex<()>,
}

impl<S, A> Core<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn base_dispatch(&self, action: A) -> Result<A> {
        self.apply(action, false)
    }

    /// Run the reducer and commit. With `always_notify` an unchanged state
    /// still counts as a transition.
    fn apply(&self, action: A, always_notify: bool) -> Result<A> {
        let _guard = self.dispatch_lock.lock();

        let prev = Arc::clone(&*self.state.read());
        let reducer = Arc::clone(&*self.reducer.read());

        // Nothing is committed unless the reducer returns normally.
        let next = reducer
            .reduce(&prev, &action)
            .map_err(|source| StoreError::Reducer {
                action_type: action.action_type().to_string(),
                source,
            })?;

        if !always_notify && Arc::ptr_eq(&prev, &next) {
            if self.config.log_skipped {
                debug!(store = %self.config.label, action_type = action.action_type(), "State unchanged");
            } else {
                trace!(store = %self.config.label, action_type = action.action_type(), "State unchanged");
            }
            return Ok(action);
        }

        *self.state.write() = next;
        let version = StoreVersion(self.version.fetch_add(1, Ordering::SeqCst) + 1);
        debug!(
            store = %self.config.label,
            action_type = action.action_type(),
            %version,
            "State committed"
        );

        self.listeners.notify(&StoreEvent::StateChanged {
            action_type: action.action_type().to_string(),
            version,
        });

        Ok(action)
    }

    fn version(&self) -> StoreVersion {
        StoreVersion(self.version.load(Ordering::SeqCst))
    }
}

/// A Redux-style state container.
///
/// Holds one state value and a reducer. `dispatch` is the only way to change
/// the state; listeners run after every dispatch that produced a new state
/// reference. Handles are cheap to clone and all refer to the same store.
pub struct Store<S, A> {
    core: Arc<Core<S, A>>,
    dispatch: Dispatch<A>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            dispatch: Arc::clone(&self.dispatch),
        }
    }
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a store with the default configuration.
    pub fn new<R>(reducer: R, initial_state: S) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        Self::with_config(StoreConfig::default(), reducer, initial_state)
    }

    /// Create a store.
    pub fn with_config<R>(config: StoreConfig, reducer: R, initial_state: S) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        debug!(store = %config.label, "Creating store");

        let core = Arc::new(Core {
            config,
            state: RwLock::new(Arc::new(initial_state)),
            reducer: RwLock::new(Arc::new(reducer)),
            listeners: Arc::new(ListenerRegistry::new()),
            version: AtomicU64::new(0),
            dispatch_lock: ReentrantMutex::new(()),
        });

        let dispatch = Self::base_dispatch_for(&core);
        Self { core, dispatch }
    }

    fn base_dispatch_for(core: &Arc<Core<S, A>>) -> Dispatch<A> {
        let core = Arc::clone(core);
        Arc::new(move |action: A| core.base_dispatch(action))
    }

    /// Current state snapshot.
    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(&*self.core.state.read())
    }

    /// Dispatch an action through the middleware chain (if any) to the
    /// reducer.
    ///
    /// Returns the dispatched action. Listeners have all run by the time this
    /// returns. A reducer error leaves the state untouched.
    pub fn dispatch(&self, action: A) -> Result<A> {
        (self.dispatch)(action)
    }

    /// The entry point `dispatch` goes through.
    pub fn dispatcher(&self) -> Dispatch<A> {
        Arc::clone(&self.dispatch)
    }

    /// Same store, different entry point. Used by enhancers.
    pub fn with_dispatch(&self, dispatch: Dispatch<A>) -> Self {
        Self {
            core: Arc::clone(&self.core),
            dispatch,
        }
    }

    /// Register a change listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let subscription = self.core.listeners.subscribe(Arc::new(listener));
        trace!(store = %self.core.config.label, listener = subscription.id().0, "Listener added");
        subscription
    }

    /// Subscribe to [`StoreEvent`]s with the configured buffer size.
    pub fn subscribe_channel(&self) -> ChannelSubscription {
        self.subscribe_channel_with(self.core.config.channel_buffer_size)
    }

    /// Subscribe to [`StoreEvent`]s with a custom buffer size.
    pub fn subscribe_channel_with(&self, buffer_size: usize) -> ChannelSubscription {
        let (subscription, receiver) = self.core.listeners.subscribe_channel(buffer_size);
        ChannelSubscription::new(subscription, receiver)
    }

    /// Swap the reducer and dispatch `@@INIT` so it can fill in defaults.
    ///
    /// The init action goes straight to the reducer, bypassing middleware.
    /// Listeners are notified exactly once even if the new reducer leaves the
    /// state as it was.
    pub fn replace_reducer<R>(&self, next_reducer: R) -> Result<()>
    where
        R: Reducer<S, A> + 'static,
    {
        let _guard = self.core.dispatch_lock.lock();

        *self.core.reducer.write() = Arc::new(next_reducer);
        debug!(store = %self.core.config.label, "Reducer replaced");

        self.core.listeners.announce(&StoreEvent::ReducerReplaced {
            version: self.core.version(),
        });

        self.core.apply(A::init(), true)?;
        Ok(())
    }

    /// Number of committed state transitions.
    pub fn version(&self) -> StoreVersion {
        self.core.version()
    }

    pub fn listener_count(&self) -> usize {
        self.core.listeners.len()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.core.config
    }

    /// A handle that doesn't keep the store alive.
    ///
    /// Listeners that need to read or dispatch should capture one of these
    /// rather than a `Store`, which would keep the store alive through its
    /// own listener list.
    pub fn downgrade(&self) -> WeakStore<S, A> {
        WeakStore {
            core: Arc::downgrade(&self.core),
            dispatch: Arc::downgrade(&self.dispatch),
        }
    }
}

impl<S, A> fmt::Debug for Store<S, A>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.core.config.label)
            .field("version", &self.core.version.load(Ordering::SeqCst))
            .field("state", &*self.core.state.read())
            .finish()
    }
}

/// Non-owning store handle. See [`Store::downgrade`].
pub struct WeakStore<S, A> {
    core: Weak<Core<S, A>>,
    dispatch: Weak<DispatchFn<A>>,
}

impl<S, A> Clone for WeakStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            core: Weak::clone(&self.core),
            dispatch: Weak::clone(&self.dispatch),
        }
    }
}

impl<S, A> WeakStore<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub fn upgrade(&self) -> Option<Store<S, A>> {
        Some(Store {
            core: self.core.upgrade()?,
            dispatch: self.dispatch.upgrade()?,
        })
    }

    pub fn get_state(&self) -> Option<Arc<S>> {
        let core = self.core.upgrade()?;
        let state = Arc::clone(&*core.state.read());
        Some(state)
    }
}

/// Transforms a freshly built store before it is handed out.
pub trait Enhancer<S, A> {
    fn enhance(self: Box<Self>, store: Store<S, A>) -> Store<S, A>;
}

impl<S, A, F> Enhancer<S, A> for F
where
    F: FnOnce(Store<S, A>) -> Store<S, A>,
{
    fn enhance(self: Box<Self>, store: Store<S, A>) -> Store<S, A> {
        (*self)(store)
    }
}

/// Build a store, optionally passing it through an enhancer such as
/// [`apply_middleware`](crate::middleware::apply_middleware).
pub fn create_store<S, A, R>(
    reducer: R,
    initial_state: S,
    enhancer: Option<Box<dyn Enhancer<S, A>>>,
) -> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
    R: Reducer<S, A> + 'static,
{
    let store = Store::new(reducer, initial_state);
    match enhancer {
        Some(enhancer) => enhancer.enhance(store),
        None => store,
    }
}
