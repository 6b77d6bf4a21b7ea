use std::sync::Arc;

use tokio::sync::Mutex;

use devcore_core::Action;
use devcore_core::Store;
use devcore_core::StoreEffect;

use crate::github::load_project_tree;
use crate::github::CodeHost;

/// The store as seen by async reactions.
pub type SharedStore = Arc<Mutex<Store>>;

pub fn shared(store: Store) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Dispatches `action` and carries out the effects that need a network
/// round-trip. Snapshot writes are left to the snapshot writer, which
/// observes the store directly.
pub async fn dispatch(store: &SharedStore, host: &dyn CodeHost, action: Action) {
    let effects = store.lock().await.dispatch(action);
    run_effects(store, host, effects).await;
}

pub async fn run_effects(store: &SharedStore, host: &dyn CodeHost, effects: Vec<StoreEffect>) {
    for effect in effects {
        match effect {
            StoreEffect::PersistSnapshot => {}
            StoreEffect::LoadProjectTree(selection) => {
                if let Err(err) = load_project_tree(store, host, selection).await {
                    tracing::warn!(error = %err, "project tree unavailable");
                }
            }
        }
    }
}
