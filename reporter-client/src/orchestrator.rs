//! Auth-aware request orchestration
//!
//! Wraps `RequestClient` calls with bearer-header injection from the shared
//! session and a single refresh-and-retry on authentication failure. Per
//! call the flow is:
//!
//! ```text
//! ATTEMPT -> SUCCESS
//!         -> AUTH_FAILURE -> REFRESH -> RETRY_SUCCESS
//!                                    -> REFRESH_FAILED / RETRY_FAILED -> LOGGED_OUT
//! ```
//!
//! The one-retry cap is structural: there is no loop, so a second
//! authentication failure can only end in a cleared session.

use crate::http::{bearer_headers, RequestBody, RequestClient};
use crate::session::{Session, SessionState};
use crate::types::RefreshedToken;
use crate::{ClientError, Result};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// What to do after a failed protected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecoveryAction {
    /// Pass the failure through unmodified.
    Surface,
    /// Mint a new access token and retry the original call once.
    RefreshAndRetry,
}

/// Refresh is attempted only for authentication failures, and only when a
/// refresh token is on hand.
pub(crate) fn recovery_action(error: &ClientError, session: &Session) -> RecoveryAction {
    if error.is_auth_expired() && !session.refresh_token.is_empty() {
        RecoveryAction::RefreshAndRetry
    } else {
        RecoveryAction::Surface
    }
}

/// Executes protected calls on behalf of the workflows. Callers never supply
/// a token; the orchestrator injects it from the shared session state.
#[derive(Clone)]
pub struct AuthOrchestrator {
    http: RequestClient,
    session: Arc<Mutex<SessionState>>,
}

impl AuthOrchestrator {
    pub fn new(http: RequestClient, session: Arc<Mutex<SessionState>>) -> Self {
        Self { http, session }
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.lock().unwrap().current()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.lock().unwrap().is_authenticated()
    }

    /// Execute a protected call. Refuses immediately, with no network
    /// attempt, when the session is unauthenticated.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Option<Value>> {
        let session = self.session();
        if !session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }

        let headers = bearer_headers(&session.access_token)?;
        let original = match self
            .http
            .send(method.clone(), path, body.clone(), headers)
            .await
        {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        match recovery_action(&original, &session) {
            RecoveryAction::Surface => Err(original),
            RecoveryAction::RefreshAndRetry => {
                tracing::debug!(path, "access token rejected, refreshing");

                let access_token = match self.refresh_access_token(&session.refresh_token).await {
                    Ok(token) => token,
                    Err(refresh_error) => {
                        tracing::info!("token refresh denied, clearing session: {}", refresh_error);
                        self.force_logout();
                        return Err(original);
                    }
                };

                // The refresh response carries no refresh token; the stored
                // one stays current.
                if let Err(e) = self.session.lock().unwrap().set_access(access_token.clone()) {
                    tracing::warn!("failed to persist refreshed access token: {}", e);
                }

                let headers = bearer_headers(&access_token)?;
                match self.http.send(method, path, body, headers).await {
                    Ok(value) => Ok(value),
                    Err(retry_error) => {
                        tracing::info!(
                            "retry after refresh failed, clearing session: {}",
                            retry_error
                        );
                        self.force_logout();
                        Err(original)
                    }
                }
            }
        }
    }

    /// Mint a new access token from the refresh token. Any failure here is a
    /// `RefreshDenied`, which always ends in a forced logout.
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<String> {
        let body = RequestBody::Form(vec![("refresh_token", refresh_token.to_string())]);
        let value = self
            .http
            .send(Method::POST, "/auth/refresh", body, HeaderMap::new())
            .await
            .map_err(|e| ClientError::RefreshDenied(e.to_string()))?
            .ok_or_else(|| ClientError::RefreshDenied("empty refresh response".to_string()))?;

        let refreshed: RefreshedToken = serde_json::from_value(value)
            .map_err(|e| ClientError::RefreshDenied(format!("malformed refresh response: {e}")))?;
        Ok(refreshed.access_token)
    }

    fn force_logout(&self) {
        if let Err(e) = self.session.lock().unwrap().clear() {
            tracing::warn!("failed to clear persisted session: {}", e);
        }
    }
}
