use tokio::sync::watch;

use super::actions::Action;
use super::reducer::reduce;
use super::reducer::StoreEffect;
use super::state::AppState;

/// Observer handle yielding every committed state (latest value wins).
pub type StateWatcher = watch::Receiver<AppState>;

/// Single owner of [`AppState`]. All mutation goes through [`Store::dispatch`],
/// which is synchronous and therefore cannot interleave with itself.
#[derive(Debug)]
pub struct Store {
    state: AppState,
    revision: u64,
    sender: watch::Sender<AppState>,
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        let (sender, _receiver) = watch::channel(initial.clone());
        Self {
            state: initial,
            revision: 0,
            sender,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Number of dispatches that changed the state.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<StoreEffect> {
        let label = action.label();
        let before = self.state.clone();
        let effects = reduce(&mut self.state, action);

        if self.state != before {
            self.revision = self.revision.saturating_add(1);
            // send_replace succeeds with zero receivers; observers may come and go.
            self.sender.send_replace(self.state.clone());
        }

        tracing::debug!(
            action = label,
            revision = self.revision,
            effects = effects.len(),
            "dispatched"
        );
        effects
    }

    pub fn subscribe(&self) -> StateWatcher {
        self.sender.subscribe()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::initial())
    }
}
