//! User-facing workflows composed over the orchestrator
//!
//! Each action is a finite sequence of orchestrated calls. Failures land in
//! a single dismissible error slot; starting a new action clears it, so
//! errors never stack across unrelated actions.

use crate::config::ClientConfig;
use crate::http::{RequestBody, RequestClient};
use crate::orchestrator::AuthOrchestrator;
use crate::session::{Session, SessionState};
use crate::types::{Report, TokenPair, UploadReceipt};
use crate::{ClientError, Result};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Sequences login, registration, upload, delete and list actions, and owns
/// the reports collection.
///
/// Independent actions may interleave; each successful list fetch replaces
/// the collection wholesale, so the last response to arrive wins. That race
/// is accepted behavior, not a defect.
pub struct WorkflowController {
    http: RequestClient,
    orchestrator: AuthOrchestrator,
    session: Arc<Mutex<SessionState>>,
    reports: Arc<RwLock<Vec<Report>>>,
    upload_in_flight: AtomicBool,
    scheduled_refresh: Mutex<Option<JoinHandle<()>>>,
    upload_refresh_delay: Duration,
    last_error: Mutex<Option<String>>,
}

impl WorkflowController {
    pub fn new(
        http: RequestClient,
        session: Arc<Mutex<SessionState>>,
        upload_refresh_delay: Duration,
    ) -> Self {
        let orchestrator = AuthOrchestrator::new(http.clone(), Arc::clone(&session));
        Self {
            http,
            orchestrator,
            session,
            reports: Arc::new(RwLock::new(Vec::new())),
            upload_in_flight: AtomicBool::new(false),
            scheduled_refresh: Mutex::new(None),
            upload_refresh_delay,
            last_error: Mutex::new(None),
        }
    }

    /// Assemble the full stack (credential store, session state, request
    /// client) from a configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let store = config.storage.build_store()?;
        let session = Arc::new(Mutex::new(SessionState::new(store)));
        let http = RequestClient::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout),
        )?;
        Ok(Self::new(
            http,
            session,
            Duration::from_secs(config.api.upload_refresh_delay),
        ))
    }

    /// Authenticate and store both tokens, then refresh the reports list.
    /// Fail-closed: the session is untouched when the login call fails.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        self.begin_action();
        let result = self.login_inner(email, password).await;
        self.surface(result)
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<()> {
        let body = RequestBody::Form(vec![
            ("email", email.to_string()),
            ("password", password.to_string()),
        ]);
        let value = self
            .http
            .send(Method::POST, "/auth/login", body, HeaderMap::new())
            .await?;
        let tokens: TokenPair = parse_payload(value)?;

        self.session
            .lock()
            .unwrap()
            .set(tokens.access_token, tokens.refresh_token)?;
        tracing::info!("logged in as {}", email);

        // Best effort: a failed first fetch leaves the session intact.
        if let Err(e) = self.fetch_and_store_reports().await {
            tracing::warn!("initial reports fetch failed: {}", e);
        }
        Ok(())
    }

    /// Create an account, then log in with the same credentials.
    /// Registration alone does not authenticate.
    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        self.begin_action();
        let body = RequestBody::Form(vec![
            ("email", email.to_string()),
            ("password", password.to_string()),
        ]);
        let result = self
            .http
            .send(Method::POST, "/auth/register", body, HeaderMap::new())
            .await;
        if let Err(e) = result {
            self.record_error(&e);
            return Err(e);
        }
        tracing::info!("registered {}", email);
        self.login(email, password).await
    }

    /// Fetch the reports list and replace the local collection wholesale.
    /// No-op when unauthenticated. On failure the stale collection stays
    /// visible.
    pub async fn refresh_reports(&self) -> Result<()> {
        self.begin_action();
        if !self.orchestrator.is_authenticated() {
            return Ok(());
        }
        let result = self.fetch_and_store_reports().await;
        self.surface(result)
    }

    /// Fetch a single report.
    pub async fn get_report(&self, id: i64) -> Result<Report> {
        self.begin_action();
        let result = async {
            let value = self
                .orchestrator
                .call(Method::GET, &format!("/reports/{id}"), RequestBody::Empty)
                .await?;
            parse_payload(value)
        }
        .await;
        self.surface(result)
    }

    /// Submit a document for report generation. Refuses when no file is
    /// given or another upload is still in flight. On success, exactly one
    /// reports re-fetch is scheduled after the configured delay; the delay is
    /// a heuristic for the asynchronous server-side processing, not a
    /// completion signal.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadReceipt> {
        self.begin_action();

        if file_name.is_empty() {
            let err = ClientError::InvalidOperation("no file selected".to_string());
            self.record_error(&err);
            return Err(err);
        }
        if self.upload_in_flight.swap(true, Ordering::SeqCst) {
            let err = ClientError::InvalidOperation("an upload is already in flight".to_string());
            self.record_error(&err);
            return Err(err);
        }

        let result = async {
            let body = RequestBody::File {
                file_name: file_name.to_string(),
                bytes,
            };
            let value = self.orchestrator.call(Method::POST, "/upload", body).await?;
            parse_payload::<UploadReceipt>(value)
        }
        .await;
        self.upload_in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(receipt) => {
                tracing::info!(report_id = receipt.report_id, "upload accepted");
                self.schedule_refresh();
                Ok(receipt)
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Delete a report. On success the list is re-fetched; on failure the
    /// error is surfaced and no re-fetch happens, so the failure is never
    /// masked by a stale-looking refresh.
    pub async fn delete_report(&self, id: i64) -> Result<()> {
        self.begin_action();
        match self
            .orchestrator
            .call(Method::DELETE, &format!("/reports/{id}"), RequestBody::Empty)
            .await
        {
            Ok(_) => {
                tracing::info!(id, "report deleted");
                if let Err(e) = self.fetch_and_store_reports().await {
                    tracing::warn!("reports refresh after delete failed: {}", e);
                    self.record_error(&e);
                }
                Ok(())
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Clear the session unconditionally. Cancels any scheduled re-fetch and
    /// empties the reports collection; subsequent protected actions are
    /// refused until the next login.
    pub fn logout(&self) -> Result<()> {
        self.begin_action();
        if let Some(handle) = self.scheduled_refresh.lock().unwrap().take() {
            handle.abort();
        }
        self.reports.write().unwrap().clear();
        let result = self.session.lock().unwrap().clear();
        self.surface(result)
    }

    /// Await the pending scheduled re-fetch, if any. Used by front-ends that
    /// want the refreshed list before rendering, and by tests.
    pub async fn wait_for_scheduled_refresh(&self) {
        let handle = self.scheduled_refresh.lock().unwrap().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!("scheduled refresh task failed: {}", e);
                }
            }
        }
    }

    /// Snapshot of the current reports collection.
    pub fn reports(&self) -> Vec<Report> {
        self.reports.read().unwrap().clone()
    }

    /// Most recent error message, if not yet dismissed or cleared by a newer
    /// action.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    pub fn dismiss_error(&self) {
        *self.last_error.lock().unwrap() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.orchestrator.is_authenticated()
    }

    pub fn session(&self) -> Session {
        self.orchestrator.session()
    }

    fn begin_action(&self) {
        *self.last_error.lock().unwrap() = None;
    }

    fn record_error(&self, error: &ClientError) {
        *self.last_error.lock().unwrap() = Some(error.to_string());
    }

    fn surface<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    async fn fetch_and_store_reports(&self) -> Result<()> {
        let list = fetch_reports(&self.orchestrator).await?;
        *self.reports.write().unwrap() = list;
        Ok(())
    }

    /// Schedule the single delayed re-fetch after an accepted upload. A
    /// newer upload supersedes (aborts) a still-pending one.
    fn schedule_refresh(&self) {
        let orchestrator = self.orchestrator.clone();
        let reports = Arc::clone(&self.reports);
        let delay = self.upload_refresh_delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match fetch_reports(&orchestrator).await {
                Ok(list) => *reports.write().unwrap() = list,
                Err(e) => tracing::warn!("scheduled reports refresh failed: {}", e),
            }
        });

        if let Some(previous) = self.scheduled_refresh.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }
}

async fn fetch_reports(orchestrator: &AuthOrchestrator) -> Result<Vec<Report>> {
    let value = orchestrator
        .call(Method::GET, "/reports", RequestBody::Empty)
        .await?;
    parse_payload(value)
}

fn parse_payload<T: DeserializeOwned>(value: Option<Value>) -> Result<T> {
    let value = value
        .ok_or_else(|| ClientError::InvalidOperation("unexpected empty response".to_string()))?;
    Ok(serde_json::from_value(value)?)
}
