use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use devcore_core::config::PersistenceConfig;
use devcore_core::persist;
use devcore_core::AppState;
use devcore_core::Consent;
use devcore_core::PersistedSnapshot;
use devcore_core::SnapshotCodec;
use devcore_core::SnapshotStorage;
use devcore_core::StateWatcher;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub writes: u32,
    pub failures: u32,
}

/// Debounced persistence of the store. Consent is fixed when the writer is
/// built; without it nothing is ever written.
pub struct SnapshotWriter {
    storage: Arc<dyn SnapshotStorage>,
    codec: SnapshotCodec,
    debounce: Duration,
    consent: Consent,
    last_written: Option<PersistedSnapshot>,
    stats: WriterStats,
}

impl SnapshotWriter {
    pub fn new(storage: Arc<dyn SnapshotStorage>, config: &PersistenceConfig, consent: Consent) -> Self {
        Self {
            storage,
            codec: config.codec(),
            debounce: config.debounce(),
            consent,
            last_written: None,
            stats: WriterStats::default(),
        }
    }

    pub fn spawn(self, watcher: StateWatcher) -> JoinHandle<WriterStats> {
        tokio::spawn(self.run(watcher))
    }

    /// Runs until the store is dropped, flushing any pending change on the way out.
    pub async fn run(mut self, mut watcher: StateWatcher) -> WriterStats {
        if !self.consent.allows_persistence() {
            tracing::debug!(consent = self.consent.label(), "snapshot writer disabled");
            return self.stats;
        }

        while watcher.changed().await.is_ok() {
            let closed = loop {
                match tokio::time::timeout(self.debounce, watcher.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) => break true,
                    Err(_elapsed) => break false,
                }
            };
            let state = watcher.borrow_and_update().clone();
            self.write(&state);
            if closed {
                break;
            }
        }
        tracing::debug!(
            writes = self.stats.writes,
            failures = self.stats.failures,
            "snapshot writer stopped"
        );
        self.stats
    }

    fn write(&mut self, state: &AppState) {
        let snapshot = PersistedSnapshot {
            saved_at_ms: None,
            ..PersistedSnapshot::capture(state, self.codec.schema_version)
        };
        if self.last_written.as_ref() == Some(&snapshot) {
            return;
        }
        match persist(self.storage.as_ref(), state, self.codec) {
            Ok(()) => {
                self.stats.writes += 1;
                self.last_written = Some(snapshot);
            }
            Err(err) => {
                // The next change tries again with the then-current state.
                self.stats.failures += 1;
                tracing::warn!(error = %err, "could not write state snapshot");
            }
        }
    }
}
