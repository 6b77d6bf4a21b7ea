use std::path::PathBuf;

use thiserror::Error;

/// Failures of the durable key-value storage behind snapshots and consent.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read key '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write key '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}
