//! Durable credential storage backends
//!
//! Tokens are opaque strings; no backend inspects or validates them. A
//! missing key always reads back as an empty token, never as an error.

use crate::session::Session;
use crate::{ClientError, Result};
use directories::ProjectDirs;
use keyring::Entry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Durable key/value persistence of the current token pair.
pub trait CredentialStore: Send + Sync {
    /// Load whatever is persisted. Never fails: missing or unreadable state
    /// yields empty tokens.
    fn load(&self) -> Session;

    /// Persist the given token pair, replacing any previous one.
    fn save(&self, session: &Session) -> Result<()>;

    /// Remove any persisted tokens. Removing nothing is not an error.
    fn clear(&self) -> Result<()>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    fn load(&self) -> Session {
        (**self).load()
    }

    fn save(&self, session: &Session) -> Result<()> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// JSON file backend, stored under the platform data directory by default.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default credentials file under the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "sjwg", "ai-reporter").ok_or_else(|| {
            ClientError::Storage("could not determine platform data directory".to_string())
        })?;
        Ok(dirs.data_dir().join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Session {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("ignoring unreadable credentials file: {}", e);
                    Session::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Session::default(),
            Err(e) => {
                tracing::warn!("failed to read credentials file: {}", e);
                Session::default()
            }
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// OS keyring backend, one entry per token under a configurable service name.
pub struct KeyringStore {
    service_name: String,
}

impl KeyringStore {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service_name, key)
            .map_err(|e| ClientError::Storage(format!("failed to create keyring entry: {e}")))
    }

    fn read_token(&self, key: &str) -> String {
        match self.entry(key).and_then(|entry| {
            entry
                .get_password()
                .map_err(|e| ClientError::Storage(e.to_string()))
        }) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("no keyring value for {}: {}", key, e);
                String::new()
            }
        }
    }

    fn delete_token(&self, key: &str) -> Result<()> {
        let entry = self.entry(key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ClientError::Storage(format!(
                "failed to remove keyring entry: {e}"
            ))),
        }
    }
}

impl CredentialStore for KeyringStore {
    fn load(&self) -> Session {
        Session {
            access_token: self.read_token(ACCESS_TOKEN_KEY),
            refresh_token: self.read_token(REFRESH_TOKEN_KEY),
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        self.entry(ACCESS_TOKEN_KEY)?
            .set_password(&session.access_token)
            .map_err(|e| ClientError::Storage(format!("failed to store access token: {e}")))?;
        self.entry(REFRESH_TOKEN_KEY)?
            .set_password(&session.refresh_token)
            .map_err(|e| ClientError::Storage(format!("failed to store refresh token: {e}")))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.delete_token(ACCESS_TOKEN_KEY)?;
        self.delete_token(REFRESH_TOKEN_KEY)?;
        Ok(())
    }
}

/// In-memory backend for tests and embedders that manage persistence
/// themselves.
#[derive(Default)]
pub struct MemoryStore {
    session: Mutex<Option<Session>>,
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Session {
        self.session.lock().unwrap().clone().unwrap_or_default()
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }
}
