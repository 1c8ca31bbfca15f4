//! Reducers: pure `(State, Action) -> State` transitions.
//!
//! State is shared as `Arc<S>`. A reducer signals "nothing changed" by
//! returning the very `Arc` it was given, which lets the store skip listener
//! notification without comparing values.

mod combine;

pub use combine::{combine_reducers, CombineReducers, CombinedReducer, SliceMap, SliceValue};

use crate::error::ReducerError;
use std::marker::PhantomData;
use std::sync::Arc;

/// Outcome of a single reducer application.
pub type ReduceResult<S> = std::result::Result<Arc<S>, ReducerError>;

/// Computes the next state from the current state and an action.
///
/// Implementations must not have side effects and must return the input
/// reference unchanged for actions they don't handle.
pub trait Reducer<S, A>: Send + Sync {
    fn reduce(&self, state: &Arc<S>, action: &A) -> ReduceResult<S>;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&Arc<S>, &A) -> ReduceResult<S> + Send + Sync,
{
    fn reduce(&self, state: &Arc<S>, action: &A) -> ReduceResult<S> {
        self(state, action)
    }
}

/// Adapter for reducers that cannot fail.
pub struct Pure<S, A, F> {
    f: F,
    _marker: PhantomData<fn(&S, &A)>,
}

/// Wrap an infallible reducer function.
pub fn pure<S, A, F>(f: F) -> Pure<S, A, F>
where
    F: Fn(&Arc<S>, &A) -> Arc<S> + Send + Sync,
{
    Pure {
        f,
        _marker: PhantomData,
    }
}

impl<S, A, F> Reducer<S, A> for Pure<S, A, F>
where
    F: Fn(&Arc<S>, &A) -> Arc<S> + Send + Sync,
{
    fn reduce(&self, state: &Arc<S>, action: &A) -> ReduceResult<S> {
        Ok((self.f)(state, action))
    }
}

/// Fold a sequence of actions over an initial state.
///
/// This is what a store holds after dispatching the same actions in order,
/// minus notification.
pub fn replay<'a, S, A, R, I>(reducer: &R, initial: Arc<S>, actions: I) -> ReduceResult<S>
where
    R: Reducer<S, A> + ?Sized,
    A: 'a,
    I: IntoIterator<Item = &'a A>,
{
    let mut state = initial;
    for action in actions {
        state = reducer.reduce(&state, action)?;
    }
    Ok(state)
}
