//! Typed actions for the counter and user slices.
//!
//! Actions arriving as JSON or as [`RawAction`]s are checked here, once.
//! Anything with an unknown `type` or a payload of the wrong shape is
//! rejected before it can reach a reducer.

use crate::error::{Result, StoreError};
use crate::slices::user::{Profile, UserData};
use crate::types::{Action, RawAction, INIT_ACTION_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;

pub const INCREMENT: &str = "INCREMENT";
pub const DECREMENT: &str = "DECREMENT";
pub const RESET: &str = "RESET";
pub const SET_VALUE: &str = "SET_VALUE";
pub const LOGIN: &str = "LOGIN";
pub const LOGOUT: &str = "LOGOUT";
pub const UPDATE_PROFILE: &str = "UPDATE_PROFILE";

/// Every action the reference reducers understand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppAction {
    #[serde(rename = "@@INIT")]
    Init,
    Increment,
    Decrement,
    Reset,
    SetValue { value: i64 },
    Login(UserData),
    Logout,
    UpdateProfile(Profile),
}

impl Action for AppAction {
    fn action_type(&self) -> &str {
        match self {
            AppAction::Init => INIT_ACTION_TYPE,
            AppAction::Increment => INCREMENT,
            AppAction::Decrement => DECREMENT,
            AppAction::Reset => RESET,
            AppAction::SetValue { .. } => SET_VALUE,
            AppAction::Login(_) => LOGIN,
            AppAction::Logout => LOGOUT,
            AppAction::UpdateProfile(_) => UPDATE_PROFILE,
        }
    }

    fn init() -> Self {
        AppAction::Init
    }
}

impl AppAction {
    /// Parse `{"type": ..., "payload": ...}`.
    ///
    /// Well-formed JSON that isn't a known action is `UnknownAction`; input
    /// that isn't valid JSON at all is a `Serialization` error.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| match e.classify() {
            Category::Data => StoreError::UnknownAction(e.to_string()),
            Category::Syntax | Category::Eof | Category::Io => StoreError::from(e),
        })
    }

    pub fn to_raw(&self) -> Result<RawAction> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }
}

impl TryFrom<RawAction> for AppAction {
    type Error = StoreError;

    fn try_from(raw: RawAction) -> Result<Self> {
        let value = serde_json::to_value(&raw)?;
        serde_json::from_value(value)
            .map_err(|e| StoreError::UnknownAction(format!("{}: {}", raw.action_type, e)))
    }
}

pub fn increment() -> AppAction {
    AppAction::Increment
}

pub fn decrement() -> AppAction {
    AppAction::Decrement
}

pub fn reset() -> AppAction {
    AppAction::Reset
}

pub fn set_value(value: i64) -> AppAction {
    AppAction::SetValue { value }
}

pub fn login(user: UserData) -> AppAction {
    AppAction::Login(user)
}

pub fn logout() -> AppAction {
    AppAction::Logout
}

pub fn update_profile(profile: Profile) -> AppAction {
    AppAction::UpdateProfile(profile)
}
