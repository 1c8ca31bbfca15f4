//! Counter slice.

use crate::actions::AppAction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which counter action produced the current value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterOp {
    Increment,
    Decrement,
    Reset,
    SetValue,
}

impl CounterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterOp::Increment => "INCREMENT",
            CounterOp::Decrement => "DECREMENT",
            CounterOp::Reset => "RESET",
            CounterOp::SetValue => "SET_VALUE",
        }
    }
}

impl fmt::Display for CounterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterState {
    pub count: i64,
    pub last_action: Option<CounterOp>,
}

impl CounterState {
    fn with(count: i64, op: CounterOp) -> Arc<Self> {
        Arc::new(CounterState {
            count,
            last_action: Some(op),
        })
    }
}

/// The count never drops below zero through `Decrement`; `SetValue` sets it
/// exactly.
pub fn reduce(state: &Arc<CounterState>, action: &AppAction) -> Arc<CounterState> {
    match action {
        AppAction::Increment => {
            CounterState::with(state.count.saturating_add(1), CounterOp::Increment)
        }
        AppAction::Decrement => {
            CounterState::with(state.count.saturating_sub(1).max(0), CounterOp::Decrement)
        }
        AppAction::Reset => CounterState::with(0, CounterOp::Reset),
        AppAction::SetValue { value } => CounterState::with(*value, CounterOp::SetValue),
        _ => Arc::clone(state),
    }
}
