use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use devcore_core::Action;
use devcore_core::FileNode;
use devcore_core::RepoSelection;
use devcore_core::User;

use crate::error::HostError;
use crate::reactions::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    All,
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoType {
    #[default]
    All,
    Owner,
    Public,
    Private,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoSort {
    Created,
    #[default]
    Updated,
    Pushed,
    FullName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

macro_rules! wire_names {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }
    };
}

wire_names!(Visibility { All => "all", Public => "public", Private => "private" });
wire_names!(RepoType {
    All => "all",
    Owner => "owner",
    Public => "public",
    Private => "private",
    Member => "member",
});
wire_names!(RepoSort {
    Created => "created",
    Updated => "updated",
    Pushed => "pushed",
    FullName => "full_name",
});
wire_names!(SortDirection { Asc => "asc", Desc => "desc" });

/// Listing filters. `visibility`/`affiliation` and `repo_type` are mutually
/// exclusive on the REST API; when both are set `repo_type` wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetReposOptions {
    pub visibility: Option<Visibility>,
    pub affiliation: Option<String>,
    pub repo_type: Option<RepoType>,
    pub sort: Option<RepoSort>,
    pub direction: Option<SortDirection>,
    pub per_page: Option<u8>,
    pub page: Option<u32>,
}

impl GetReposOptions {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(repo_type) = self.repo_type {
            pairs.push(("type", repo_type.as_str().to_string()));
        } else {
            if let Some(visibility) = self.visibility {
                pairs.push(("visibility", visibility.as_str().to_string()));
            }
            if let Some(affiliation) = &self.affiliation {
                pairs.push(("affiliation", affiliation.clone()));
            }
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        if let Some(direction) = self.direction {
            pairs.push(("direction", direction.as_str().to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.min(100).to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateRepoOptions {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitignore_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_branch_on_merge: Option<bool>,
}

impl CreateRepoOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub private: bool,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    Commit,
}

/// One row of a recursive git tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: TreeEntryKind::Blob,
        }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: TreeEntryKind::Tree,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    pub path: String,
    pub content: String,
}

/// Remote code host. The session token travels with every call; the
/// implementation holds no credentials of its own.
#[async_trait]
pub trait CodeHost: Send + Sync {
    async fn authenticated_user(&self, token: &str) -> Result<User, HostError>;

    async fn list_repos(
        &self,
        token: &str,
        options: &GetReposOptions,
    ) -> Result<Vec<Repository>, HostError>;

    async fn repo_tree(&self, token: &str, owner: &str, repo: &str)
        -> Result<Vec<TreeEntry>, HostError>;

    async fn file_content(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, HostError>;

    /// Returns the new commit's URL.
    async fn commit_files(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        files: &[CommitFile],
        message: &str,
        branch: &str,
    ) -> Result<String, HostError>;

    async fn create_repo(
        &self,
        token: &str,
        options: &CreateRepoOptions,
    ) -> Result<Repository, HostError>;

    async fn delete_repo(&self, token: &str, owner: &str, repo: &str) -> Result<(), HostError>;
}

/// Turns a flat listing into a tree rooted at `repo`. Parent folders missing
/// from the listing are created; submodule entries are skipped.
pub fn build_file_tree(repo: &str, entries: &[TreeEntry]) -> FileNode {
    let mut root = FileNode::folder(repo, "", Vec::new());
    for entry in entries {
        if entry.kind == TreeEntryKind::Commit {
            continue;
        }
        let segments: Vec<&str> = entry.path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            continue;
        }
        insert(&mut root, &segments, 0, entry.kind);
    }
    root.sort_children();
    root
}

fn insert(parent: &mut FileNode, segments: &[&str], depth: usize, kind: TreeEntryKind) {
    let name = segments[depth];
    let path = segments[..=depth].join("/");
    let is_leaf = depth + 1 == segments.len();
    let children = parent.children.get_or_insert_with(Vec::new);

    if is_leaf && kind == TreeEntryKind::Blob {
        if !children.iter().any(|child| child.path == path) {
            children.push(FileNode::file(name, path));
        }
        return;
    }

    let idx = match children
        .iter()
        .position(|child| child.path == path && child.is_folder())
    {
        Some(idx) => idx,
        None => {
            children.push(FileNode::folder(name, path, Vec::new()));
            children.len() - 1
        }
    };
    if !is_leaf {
        insert(&mut children[idx], segments, depth + 1, kind);
    }
}

/// Fetches the tree for `selection` and stores it if the selection is still
/// current when the listing arrives.
pub async fn load_project_tree(
    store: &SharedStore,
    host: &dyn CodeHost,
    selection: RepoSelection,
) -> Result<bool, HostError> {
    let token = {
        let store = store.lock().await;
        store.state().session.token.clone()
    }
    .ok_or(HostError::Unauthorized)?;

    let entries = host
        .repo_tree(&token, &selection.owner, &selection.repo)
        .await
        .map_err(|err| {
            tracing::warn!(repo = %selection.full_name(), error = %err, "could not load repository tree");
            err
        })?;
    let root = build_file_tree(&selection.repo, &entries);

    let mut store = store.lock().await;
    if store.state().selected_repo.as_ref() != Some(&selection) {
        tracing::debug!(repo = %selection.full_name(), "selection moved on, dropping tree");
        return Ok(false);
    }
    tracing::debug!(
        repo = %selection.full_name(),
        files = root.file_count(),
        "project tree loaded"
    );
    store.dispatch(Action::LoadProjectFiles(Some(root)));
    Ok(true)
}
