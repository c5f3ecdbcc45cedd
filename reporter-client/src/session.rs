//! Session state - the authoritative view of the current token pair

use crate::credentials::CredentialStore;
use crate::Result;
use serde::{Deserialize, Serialize};

/// The current access/refresh token pair. Both tokens are opaque strings and
/// either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// A session is authenticated exactly when the access token is non-empty.
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Value for the `Authorization` header on protected calls.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Single source of truth for the current session. Every mutation persists
/// through the credential store before memory is updated, so storage and
/// memory always agree once an operation returns.
pub struct SessionState {
    session: Session,
    store: Box<dyn CredentialStore>,
}

impl SessionState {
    /// Seed the in-memory session from whatever the store holds. Missing or
    /// unreadable state yields an unauthenticated session.
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        let session = store.load();
        if session.is_authenticated() {
            tracing::debug!("restored persisted session");
        }
        Self { session, store }
    }

    /// Replace both tokens.
    pub fn set(
        &mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<()> {
        let session = Session::new(access_token, refresh_token);
        self.store.save(&session)?;
        self.session = session;
        Ok(())
    }

    /// Replace the access token only, preserving the stored refresh token.
    /// Used after a refresh, whose response omits the refresh token.
    pub fn set_access(&mut self, access_token: impl Into<String>) -> Result<()> {
        let session = Session::new(access_token, self.session.refresh_token.clone());
        self.store.save(&session)?;
        self.session = session;
        Ok(())
    }

    /// Drop both tokens. Idempotent.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        self.session = Session::default();
        Ok(())
    }

    /// Read-only snapshot of the current session.
    pub fn current(&self) -> Session {
        self.session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }
}
