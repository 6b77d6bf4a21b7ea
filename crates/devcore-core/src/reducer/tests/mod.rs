use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use super::StoreEffect;
pub(super) use crate::actions::Action;
pub(super) use crate::state::AppState;
pub(super) use crate::state::FileNode;
pub(super) use crate::state::RepoSelection;
pub(super) use crate::state::Session;
pub(super) use crate::state::User;
pub(super) use crate::state::ViewId;
pub(super) use crate::state::ViewProps;

mod navigation;

fn state() -> AppState {
    AppState::initial()
}

fn user(login: &str) -> User {
    User {
        login: login.to_string(),
        id: 42,
        avatar_url: format!("https://avatars.example/{login}"),
        html_url: format!("https://github.com/{login}"),
        name: None,
    }
}

fn tree(repo: &str) -> FileNode {
    FileNode::folder(
        repo,
        "",
        vec![
            FileNode::file("README.md", "README.md"),
            FileNode::folder("src", "src", vec![FileNode::file("lib.rs", "src/lib.rs")]),
        ],
    )
}

fn run(state: &mut AppState, actions: Vec<Action>) -> Vec<StoreEffect> {
    actions
        .into_iter()
        .flat_map(|action| reduce(state, action))
        .collect()
}

fn assert_session_cleared(state: &AppState) {
    assert_eq!(state.session, Session::default());
    assert!(state.selected_repo.is_none());
    assert!(state.project_files.is_none());
    assert_eq!(state.active_view, ViewId::default());
}
