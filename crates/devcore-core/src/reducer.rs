use super::actions::Action;
use super::state::AppState;
use super::state::FeatureId;
use super::state::FileNode;
use super::state::RepoSelection;
use super::state::User;
use super::state::ViewId;
use super::state::ViewProps;

/// Side effects requested by a transition. The reducer never performs them;
/// the reaction layer (snapshot writer, tree loader) does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEffect {
    /// A field that survives reloads changed.
    PersistSnapshot,
    /// A different repository became selected; its tree is not cached.
    LoadProjectTree(RepoSelection),
}

pub fn reduce(state: &mut AppState, action: Action) -> Vec<StoreEffect> {
    match action {
        Action::Navigate { view, props } => navigate(state, view, props),
        Action::ToggleFeatureVisibility { feature_id } => toggle_feature(state, feature_id),
        Action::Login { user, token } => login(state, user, token),
        Action::Logout => logout(state),
        Action::SetSelectedRepo(selection) => select_repo(state, selection),
        Action::LoadProjectFiles(files) => load_project_files(state, files),
    }
}

fn navigate(state: &mut AppState, view: ViewId, props: ViewProps) -> Vec<StoreEffect> {
    // Props are view-specific; the previous view's bag is always dropped.
    state.view_props = props;
    if state.active_view == view {
        return Vec::new();
    }
    state.active_view = view;
    vec![StoreEffect::PersistSnapshot]
}

fn toggle_feature(state: &mut AppState, feature_id: FeatureId) -> Vec<StoreEffect> {
    if let Some(idx) = state.hidden_features.iter().position(|id| *id == feature_id) {
        state.hidden_features.remove(idx);
    } else {
        state.hidden_features.push(feature_id);
    }
    vec![StoreEffect::PersistSnapshot]
}

fn login(state: &mut AppState, user: User, token: String) -> Vec<StoreEffect> {
    let token_changed = state.session.token.as_deref() != Some(token.as_str());
    state.session.authenticated = true;
    state.session.user = Some(user);
    state.session.token = Some(token);
    if token_changed {
        vec![StoreEffect::PersistSnapshot]
    } else {
        Vec::new()
    }
}

fn logout(state: &mut AppState) -> Vec<StoreEffect> {
    *state = state.session_reset();
    vec![StoreEffect::PersistSnapshot]
}

fn select_repo(state: &mut AppState, selection: Option<RepoSelection>) -> Vec<StoreEffect> {
    // Same repository with its tree cached: nothing to do. Clearing the
    // selection always drops the tree.
    if selection.is_some() && state.selected_repo == selection && state.project_files.is_some() {
        return Vec::new();
    }

    let changed = state.selected_repo != selection;
    state.selected_repo = selection.clone();
    state.project_files = None;

    let mut effects = Vec::new();
    if changed {
        effects.push(StoreEffect::PersistSnapshot);
    }
    if let Some(selection) = selection {
        effects.push(StoreEffect::LoadProjectTree(selection));
    }
    effects
}

fn load_project_files(state: &mut AppState, files: Option<FileNode>) -> Vec<StoreEffect> {
    state.project_files = files.map(|mut root| {
        root.sort_children();
        root
    });
    Vec::new()
}

#[cfg(test)]
mod tests;
