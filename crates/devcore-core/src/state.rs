use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_VIEW: &str = "ai-command-center";
pub const FEATURES_LIST_VIEW: &str = "features-list";
pub const SETTINGS_VIEW: &str = "settings";

pub const CHROME_VIEWS: [&str; 2] = [FEATURES_LIST_VIEW, SETTINGS_VIEW];

/// Stable identifier of a catalog feature (kebab-case, e.g. `ai-code-explainer`).
pub type FeatureId = String;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub String);

impl ViewId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_chrome(&self) -> bool {
        CHROME_VIEWS.contains(&self.0.as_str())
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self(DEFAULT_VIEW.to_string())
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// View-specific properties handed to the active panel. Never persisted.
pub type ViewProps = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub user: Option<User>,
    pub token: Option<String>,
}

impl Session {
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }

    pub fn login(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.login.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSelection {
    pub owner: String,
    pub repo: String,
}

impl RepoSelection {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parses `owner/repo`. Both halves must be non-empty.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.trim().split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self::new(owner, repo))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: FileKind::File,
            children: None,
        }
    }

    pub fn folder(name: impl Into<String>, path: impl Into<String>, children: Vec<FileNode>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: FileKind::Folder,
            children: Some(children),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }

    pub fn children(&self) -> &[FileNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn find(&self, path: &str) -> Option<&FileNode> {
        if self.path == path {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(path))
    }

    pub fn file_count(&self) -> usize {
        match self.kind {
            FileKind::File => 1,
            FileKind::Folder => self.children().iter().map(FileNode::file_count).sum(),
        }
    }

    /// Folders first, then by name, recursively.
    pub fn sort_children(&mut self) {
        if let Some(children) = self.children.as_mut() {
            children.sort_by(|a, b| {
                b.is_folder()
                    .cmp(&a.is_folder())
                    .then_with(|| a.name.cmp(&b.name))
            });
            for child in children.iter_mut() {
                child.sort_children();
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub active_view: ViewId,
    pub view_props: ViewProps,
    pub hidden_features: Vec<FeatureId>,
    pub session: Session,
    pub selected_repo: Option<RepoSelection>,
    pub project_files: Option<FileNode>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::initial()
    }
}

impl AppState {
    pub fn initial() -> Self {
        Self {
            active_view: ViewId::default(),
            view_props: ViewProps::new(),
            hidden_features: Vec::new(),
            session: Session::default(),
            selected_repo: None,
            project_files: None,
        }
    }

    pub fn is_hidden(&self, feature_id: &str) -> bool {
        self.hidden_features.iter().any(|id| id == feature_id)
    }

    pub fn is_connected(&self) -> bool {
        self.session.authenticated
    }

    /// State after logout: everything returns to its initial value except
    /// the hidden-feature preference.
    pub fn session_reset(&self) -> Self {
        Self {
            hidden_features: self.hidden_features.clone(),
            ..Self::initial()
        }
    }
}
