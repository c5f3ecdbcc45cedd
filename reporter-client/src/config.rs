//! Client configuration

use crate::credentials::{CredentialStore, FileStore, KeyringStore, MemoryStore};
use crate::http::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the reporter client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    /// API endpoint configuration
    pub api: ApiConfig,

    /// Credential storage configuration
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base address for all calls, including the path prefix
    pub base_url: String,

    /// Request timeout (seconds)
    pub timeout: u64,

    /// Delay before the post-upload reports re-fetch (seconds)
    pub upload_refresh_delay: u64,
}

/// Credential storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend persists the token pair
    pub backend: StorageBackend,

    /// Credentials file path (file backend; platform default when unset)
    pub credentials_file: Option<String>,

    /// Service name for keyring entries (keyring backend)
    pub keyring_service: String,
}

/// Credential storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Keyring,
    /// No persistence across restarts; for tests and embedders.
    Memory,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, json)
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: 30,
            upload_refresh_delay: 3,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            credentials_file: None,
            keyring_service: "ai-reporter".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl StorageConfig {
    /// Build the configured credential store.
    pub fn build_store(&self) -> crate::Result<Box<dyn CredentialStore>> {
        match self.backend {
            StorageBackend::File => {
                let path = match &self.credentials_file {
                    Some(path) => path.into(),
                    None => FileStore::default_path()?,
                };
                Ok(Box::new(FileStore::new(path)))
            }
            StorageBackend::Keyring => Ok(Box::new(KeyringStore::new(&self.keyring_service))),
            StorageBackend::Memory => Ok(Box::new(MemoryStore::default())),
        }
    }
}

impl ClientConfig {
    /// Load configuration from file, or fall back to defaults when no path
    /// is given.
    pub fn load_or_default(config_path: Option<&str>) -> crate::Result<Self> {
        match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let config: ClientConfig = serde_json::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to file.
    pub fn save(&self, config_path: &str) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.upload_refresh_delay, 3);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let path = path.to_str().unwrap();

        let mut config = ClientConfig::default();
        config.api.base_url = "https://reports.example.com/api".to_string();
        config.storage.backend = StorageBackend::Keyring;
        config.logging.format = "json".to_string();
        config.save(path).unwrap();

        let loaded = ClientConfig::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.api.base_url, "https://reports.example.com/api");
        assert_eq!(loaded.storage.backend, StorageBackend::Keyring);
        assert_eq!(loaded.logging.format, "json");
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = ClientConfig::load_or_default(None).unwrap();
        assert_eq!(config.api.timeout, 30);
    }

    #[test]
    fn test_memory_backend_builds() {
        let storage = StorageConfig {
            backend: StorageBackend::Memory,
            credentials_file: None,
            keyring_service: "test".to_string(),
        };
        let store = storage.build_store().unwrap();
        assert_eq!(store.load(), crate::session::Session::default());
    }
}
