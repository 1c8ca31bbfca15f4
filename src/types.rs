//! Core types for the state container.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action type the store dispatches when a reducer is installed or replaced.
pub const INIT_ACTION_TYPE: &str = "@@INIT";

/// Something that can be dispatched to a store.
///
/// Every action carries a string discriminator. Implementors also provide the
/// reserved initialization action so the store can ask a freshly installed
/// reducer to populate its defaults.
pub trait Action: fmt::Debug + Send + 'static {
    /// The discriminator, e.g. `"INCREMENT"`.
    fn action_type(&self) -> &str;

    /// The reserved `@@INIT` action.
    fn init() -> Self;

    fn is_init(&self) -> bool {
        self.action_type() == INIT_ACTION_TYPE
    }
}

/// An open, loosely-typed action record.
///
/// Useful at boundaries where actions arrive as JSON, and for reducers that
/// don't need a closed action set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl RawAction {
    /// Create an action without a payload.
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
        }
    }

    /// Create an action with a JSON payload.
    pub fn with_payload(
        action_type: impl Into<String>,
        payload: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            action_type: action_type.into(),
            payload: Some(serde_json::to_value(payload)?),
        })
    }
}

impl Action for RawAction {
    fn action_type(&self) -> &str {
        &self.action_type
    }

    fn init() -> Self {
        RawAction::new(INIT_ACTION_TYPE)
    }
}

/// Number of committed state transitions.
///
/// Version 0 is the initial state. Dispatches that leave the state reference
/// unchanged don't advance it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct StoreVersion(pub u64);

impl StoreVersion {
    pub fn next(self) -> Self {
        StoreVersion(self.0 + 1)
    }
}

impl fmt::Debug for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);
