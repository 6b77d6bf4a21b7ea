use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::persistence::SnapshotCodec;
use super::persistence::SNAPSHOT_SCHEMA_VERSION;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub persistence: PersistenceConfig,
    pub model: ModelConfig,
    pub registry: RegistryConfig,
    pub image: ImageRetryConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PersistenceConfig {
    pub debounce_ms: u64,
    pub schema_version: u16,
    pub storage_dir: Option<PathBuf>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            storage_dir: None,
        }
    }
}

impl PersistenceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn codec(&self) -> SnapshotCodec {
        SnapshotCodec::new(self.schema_version)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub default_model: String,
    pub default_temperature: f32,
    pub structured_temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: "gemini-2.5-flash".to_string(),
            default_temperature: 0.5,
            structured_temperature: 0.2,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryConfig {
    pub max_load_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_load_attempts: 3,
            retry_delay_ms: 250,
        }
    }
}

impl RegistryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ImageRetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for ImageRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
        }
    }
}

impl ImageRetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    /// Backend endpoint that trades an OAuth code for a token. The client
    /// secret lives there, never here.
    pub token_exchange_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_exchange_url: "https://localhost/oauth/callback".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: Config = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.persistence.debounce(), Duration::from_millis(500));
        assert_eq!(config.image.max_retries, 3);
        assert_eq!(config.registry.max_load_attempts, 3);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"persistence":{"debounce_ms":50}}"#).expect("parse");
        assert_eq!(config.persistence.debounce_ms, 50);
        assert_eq!(config.persistence.schema_version, SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(config.model.default_model, "gemini-2.5-flash");
    }
}
