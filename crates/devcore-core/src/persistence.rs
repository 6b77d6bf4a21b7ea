use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;

use super::error::StorageError;
use super::state::AppState;
use super::state::FeatureId;
use super::state::RepoSelection;
use super::state::ViewId;

pub const CONSENT_KEY: &str = "devcore_ls_consent";
pub const SNAPSHOT_KEY: &str = "devcore_snapshot";

pub const SNAPSHOT_SCHEMA_VERSION: u16 = 1;

/// Durable string key-value storage (a directory of files, or memory).
pub trait SnapshotStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// One file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Unavailable {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SnapshotStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        write_private(&tmp, value)
            .and_then(|()| std::fs::rename(&tmp, &path))
            .map_err(|source| StorageError::Write {
                key: key.to_string(),
                source,
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }
}

fn write_private(path: &Path, value: &str) -> std::io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(value.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Non-persistent storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a usable map.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.lock().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consent {
    Granted,
    Denied,
    Unknown,
}

impl Consent {
    pub fn label(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Unknown => "unknown",
        }
    }

    pub fn allows_persistence(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Reads the consent flag. Unreadable storage counts as no answer.
pub fn read_consent(storage: &dyn SnapshotStorage) -> Consent {
    match storage.get(CONSENT_KEY) {
        Ok(Some(value)) => match value.trim() {
            "granted" => Consent::Granted,
            "denied" => Consent::Denied,
            _ => Consent::Unknown,
        },
        Ok(None) => Consent::Unknown,
        Err(err) => {
            tracing::warn!(error = %err, "could not read persistence consent");
            Consent::Unknown
        }
    }
}

pub fn write_consent(storage: &dyn SnapshotStorage, granted: bool) -> Result<(), StorageError> {
    let value = if granted { "granted" } else { "denied" };
    storage.set(CONSENT_KEY, value)?;
    if !granted {
        storage.remove(SNAPSHOT_KEY)?;
    }
    Ok(())
}

/// The reduced state that survives a reload. Field names match the
/// browser-era snapshot so older files still hydrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub version: u16,
    #[serde(default)]
    pub active_view: Option<ViewId>,
    #[serde(default)]
    pub hidden_features: Option<Vec<FeatureId>>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub selected_repo: Option<RepoSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at_ms: Option<i64>,
}

impl PersistedSnapshot {
    pub fn capture(state: &AppState, version: u16) -> Self {
        Self {
            version,
            active_view: Some(state.active_view.clone()),
            hidden_features: Some(state.hidden_features.clone()),
            token: state.session.token.clone(),
            selected_repo: state.selected_repo.clone(),
            saved_at_ms: Some(chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Overlays the snapshot on the initial state. The session comes back
    /// with its token only; the profile check restores the user.
    pub fn restore(self) -> AppState {
        let mut state = AppState::initial();
        if let Some(view) = self.active_view.filter(|view| !view.as_str().is_empty()) {
            state.active_view = view;
        }
        if let Some(hidden) = self.hidden_features {
            state.hidden_features = hidden;
        }
        state.session.token = self.token.filter(|token| !token.is_empty());
        state.selected_repo = self.selected_repo;
        state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotCodec {
    pub schema_version: u16,
}

impl Default for SnapshotCodec {
    fn default() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
        }
    }
}

impl SnapshotCodec {
    pub fn new(schema_version: u16) -> Self {
        Self { schema_version }
    }

    pub fn encode(&self, state: &AppState) -> Result<String, StorageError> {
        let snapshot = PersistedSnapshot::capture(state, self.schema_version);
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// `None` for malformed JSON or a schema newer than this codec.
    pub fn decode(&self, raw: &str) -> Option<PersistedSnapshot> {
        let snapshot = match serde_json::from_str::<PersistedSnapshot>(raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "discarding unparseable state snapshot");
                return None;
            }
        };
        if snapshot.version > self.schema_version {
            tracing::warn!(
                found = snapshot.version,
                supported = self.schema_version,
                "discarding snapshot written by a newer schema"
            );
            return None;
        }
        Some(snapshot)
    }
}

/// Startup hydration. Every failure path yields the initial state.
pub fn hydrate(storage: &dyn SnapshotStorage, consent: Consent, codec: SnapshotCodec) -> AppState {
    if !consent.allows_persistence() {
        return AppState::initial();
    }
    let raw = match storage.get(SNAPSHOT_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return AppState::initial(),
        Err(err) => {
            tracing::warn!(error = %err, "state snapshot unavailable, starting fresh");
            return AppState::initial();
        }
    };
    match codec.decode(&raw) {
        Some(snapshot) => {
            tracing::debug!(version = snapshot.version, "hydrated state snapshot");
            snapshot.restore()
        }
        None => AppState::initial(),
    }
}

pub fn persist(
    storage: &dyn SnapshotStorage,
    state: &AppState,
    codec: SnapshotCodec,
) -> Result<(), StorageError> {
    let encoded = codec.encode(state)?;
    storage.set(SNAPSHOT_KEY, &encoded)
}
