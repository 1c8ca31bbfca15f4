//! # flux-store
//!
//! A small, deterministic, Redux-style state container.
//!
//! ## Core Concepts
//!
//! - **Store**: owns one state value; `dispatch` is the only mutator
//! - **Reducers**: pure `(State, Action) -> State` functions; returning the
//!   same `Arc` means "no change" and suppresses notification
//! - **Slices**: `combine_reducers` gives each named slice its own reducer
//! - **Middleware**: dispatch wrappers composed first-is-outermost
//! - **Subscriptions**: callbacks and event channels notified in
//!   registration order
//!
//! ## Example
//!
//! ```ignore
//! use flux_store::{actions, apply_middleware, create_store, slices, LoggerMiddleware};
//!
//! let store = create_store(
//!     slices::root_reducer(),
//!     slices::initial_state(),
//!     Some(apply_middleware(vec![Arc::new(LoggerMiddleware::new())])),
//! );
//!
//! let sub = store.subscribe(|| println!("changed"));
//! store.dispatch(actions::increment())?;
//! assert_eq!(slices::selectors::count(&store.get_state()), 1);
//! sub.unsubscribe();
//! ```

pub mod actions;
pub mod connect;
pub mod error;
pub mod middleware;
pub mod reducer;
pub mod slices;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use actions::AppAction;
pub use connect::{connect, Connection};
pub use error::{ReducerError, Result, StoreError};
pub use middleware::{
    apply_middleware, ApplyMiddleware, JsonFileSink, LogSink, LoggerMiddleware, MemorySink,
    Middleware, MiddlewareApi, PersistMiddleware, PersistSink, TracingSink,
};
pub use reducer::{
    combine_reducers, pure, replay, CombineReducers, CombinedReducer, ReduceResult, Reducer,
    SliceMap, SliceValue,
};
pub use store::{create_store, Dispatch, DispatchFn, Enhancer, Store, StoreConfig, WeakStore};
pub use subscriptions::{
    ChannelSubscription, DropReason, Listener, ListenerRegistry, StoreEvent, Subscription,
};
pub use types::*;
