//! Reference slices: a clamped counter and a user session.
//!
//! `root_reducer` combines them under the `counter` and `user` keys; the
//! selectors read them back out of the combined state.

pub mod counter;
pub mod user;

pub use counter::{CounterOp, CounterState};
pub use user::{Profile, UserData, UserState};

use crate::actions::AppAction;
use crate::reducer::{combine_reducers, pure, CombinedReducer, SliceMap};

pub const COUNTER: &str = "counter";
pub const USER: &str = "user";

/// Counter and user reducers combined.
pub fn root_reducer() -> CombinedReducer<AppAction> {
    combine_reducers()
        .slice(COUNTER, pure(counter::reduce))
        .slice(USER, pure(user::reduce))
        .build()
}

/// Both slices at their defaults.
pub fn initial_state() -> SliceMap {
    SliceMap::new()
        .with_slice(COUNTER, CounterState::default())
        .with_slice(USER, UserState::default())
}

/// Read-only projections of the combined state.
pub mod selectors {
    use super::*;

    /// Current count; 0 before the counter slice exists.
    pub fn count(state: &SliceMap) -> i64 {
        state
            .get::<CounterState>(COUNTER)
            .map(|c| c.count)
            .unwrap_or_default()
    }

    pub fn last_action(state: &SliceMap) -> Option<CounterOp> {
        state.get::<CounterState>(COUNTER)?.last_action
    }

    pub fn user(state: &SliceMap) -> Option<UserData> {
        state.get::<UserState>(USER)?.user.clone()
    }

    pub fn is_logged_in(state: &SliceMap) -> bool {
        state
            .get::<UserState>(USER)
            .map(|u| u.is_logged_in)
            .unwrap_or(false)
    }

    pub fn user_profile(state: &SliceMap) -> Option<Profile> {
        state.get::<UserState>(USER)?.profile.clone()
    }
}
