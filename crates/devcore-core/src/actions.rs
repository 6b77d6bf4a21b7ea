use serde::Deserialize;
use serde::Serialize;

use super::state::FeatureId;
use super::state::FileNode;
use super::state::RepoSelection;
use super::state::User;
use super::state::ViewId;
use super::state::ViewProps;

/// The closed set of state transitions. Serialized as `{ "type": ..., "payload": ... }`
/// so recorded action logs can be replayed against a fresh store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    #[serde(rename = "SET_VIEW")]
    Navigate {
        view: ViewId,
        #[serde(default)]
        props: ViewProps,
    },
    #[serde(rename = "TOGGLE_FEATURE_VISIBILITY")]
    ToggleFeatureVisibility {
        #[serde(rename = "featureId")]
        feature_id: FeatureId,
    },
    #[serde(rename = "LOGIN")]
    Login { user: User, token: String },
    #[serde(rename = "LOGOUT")]
    Logout,
    #[serde(rename = "SET_SELECTED_REPO")]
    SetSelectedRepo(Option<RepoSelection>),
    #[serde(rename = "LOAD_PROJECT_FILES")]
    LoadProjectFiles(Option<FileNode>),
}

impl Action {
    pub fn navigate(view: impl Into<String>) -> Self {
        Self::Navigate {
            view: ViewId::new(view),
            props: ViewProps::new(),
        }
    }

    pub fn toggle_feature(feature_id: impl Into<String>) -> Self {
        Self::ToggleFeatureVisibility {
            feature_id: feature_id.into(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "SET_VIEW",
            Self::ToggleFeatureVisibility { .. } => "TOGGLE_FEATURE_VISIBILITY",
            Self::Login { .. } => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::SetSelectedRepo(_) => "SET_SELECTED_REPO",
            Self::LoadProjectFiles(_) => "LOAD_PROJECT_FILES",
        }
    }
}
