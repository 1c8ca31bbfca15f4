//! User session slice.

use crate::actions::AppAction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Profile {
    /// Fields set in `patch` win; unset fields keep their current value.
    pub fn merged(&self, patch: &Profile) -> Profile {
        Profile {
            avatar: patch.avatar.clone().or_else(|| self.avatar.clone()),
            bio: patch.bio.clone().or_else(|| self.bio.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub name: String,
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub is_logged_in: bool,
    pub user: Option<UserData>,
    pub profile: Option<Profile>,
}

pub fn reduce(state: &Arc<UserState>, action: &AppAction) -> Arc<UserState> {
    match action {
        AppAction::Login(user) => Arc::new(UserState {
            is_logged_in: true,
            user: Some(user.clone()),
            profile: user.profile.clone(),
        }),
        AppAction::Logout => Arc::new(UserState::default()),
        AppAction::UpdateProfile(patch) => {
            let profile = match &state.profile {
                Some(current) => current.merged(patch),
                None => patch.clone(),
            };
            Arc::new(UserState {
                profile: Some(profile),
                ..(**state).clone()
            })
        }
        _ => Arc::clone(state),
    }
}
