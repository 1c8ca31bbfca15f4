//! Change notification for store consumers.
//!
//! Two kinds of subscriber share one registration order:
//! - Callbacks: zero-argument closures run synchronously inside `dispatch`
//! - Channels: bounded queues of [`StoreEvent`]s for consumers on other threads
//!
//! Slow channel subscribers are dropped rather than blocking a dispatch.
//!
//! # Example
//!
//! ```ignore
//! let events = store.subscribe_channel();
//!
//! loop {
//!     match events.recv() {
//!         Ok(StoreEvent::StateChanged { version, .. }) => println!("now at {}", version),
//!         Ok(StoreEvent::Dropped { reason }) => break,
//!         Ok(_) => {}
//!         Err(_) => break,
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::{Listener, ListenerRegistry};
pub use types::{ChannelSubscription, DropReason, StoreEvent, Subscription};
