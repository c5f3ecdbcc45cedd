//! Refresh-and-retry behavior of the auth-aware orchestrator against a mock
//! server. Call counts are pinned with `expect(..)`, so an extra or missing
//! network attempt fails the test when the mock server verifies on drop.

use reporter_client::{
    AuthOrchestrator, ClientError, MemoryStore, RequestBody, RequestClient, Session, SessionState,
};
use reqwest::Method;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_state(access: &str, refresh: &str) -> Arc<Mutex<SessionState>> {
    let mut state = SessionState::new(Box::new(MemoryStore::default()));
    if !access.is_empty() || !refresh.is_empty() {
        state.set(access, refresh).unwrap();
    }
    Arc::new(Mutex::new(state))
}

fn orchestrator(server: &MockServer, session: Arc<Mutex<SessionState>>) -> AuthOrchestrator {
    let base_url = format!("{}/api", server.uri());
    let http = RequestClient::new(&base_url, Duration::from_secs(5)).unwrap();
    AuthOrchestrator::new(http, session)
}

#[tokio::test]
async fn expired_token_is_refreshed_and_call_retried_exactly_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_string_contains("refresh_token=R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_state("A1", "R1");
    let orchestrator = orchestrator(&server, Arc::clone(&session));

    let result = orchestrator
        .call(Method::GET, "/reports", RequestBody::Empty)
        .await
        .unwrap();
    assert_eq!(result, Some(json!([])));

    // New access token, refresh token preserved from before.
    assert_eq!(session.lock().unwrap().current(), Session::new("A2", "R1"));
}

#[tokio::test]
async fn denied_refresh_clears_session_and_surfaces_original_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid refresh token"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = session_state("A1", "R1");
    let orchestrator = orchestrator(&server, Arc::clone(&session));

    let error = orchestrator
        .call(Method::GET, "/reports", RequestBody::Empty)
        .await
        .unwrap_err();

    // The original call's failure is surfaced, not the refresh failure.
    assert!(error.is_auth_expired());
    assert_eq!(error.to_string(), "Token expired");
    assert_eq!(session.lock().unwrap().current(), Session::default());
}

#[tokio::test]
async fn failed_retry_clears_session_and_surfaces_original_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .expect(1)
        .mount(&server)
        .await;
    // The retried call is rejected as well; there must be no second refresh.
    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Still invalid"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_state("A1", "R1");
    let orchestrator = orchestrator(&server, Arc::clone(&session));

    let error = orchestrator
        .call(Method::GET, "/reports", RequestBody::Empty)
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "Token expired");
    assert_eq!(session.lock().unwrap().current(), Session::default());
}

#[tokio::test]
async fn non_auth_failure_surfaces_without_refresh_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "Database unavailable"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_state("A1", "R1");
    let orchestrator = orchestrator(&server, Arc::clone(&session));

    let error = orchestrator
        .call(Method::GET, "/reports", RequestBody::Empty)
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert_eq!(error.to_string(), "Database unavailable");
    // Session untouched by a non-auth failure.
    assert_eq!(session.lock().unwrap().current(), Session::new("A1", "R1"));
}

#[tokio::test]
async fn auth_failure_without_refresh_token_is_surfaced_directly() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "A2"})))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_state("A1", "");
    let orchestrator = orchestrator(&server, session);

    let error = orchestrator
        .call(Method::GET, "/reports", RequestBody::Empty)
        .await
        .unwrap_err();
    assert!(error.is_auth_expired());
}

#[tokio::test]
async fn unauthenticated_call_never_reaches_the_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_state("", "");
    let orchestrator = orchestrator(&server, session);

    let result = orchestrator
        .call(Method::GET, "/reports", RequestBody::Empty)
        .await;
    assert!(matches!(result, Err(ClientError::NotAuthenticated)));
}

#[tokio::test]
async fn error_without_detail_body_falls_back_to_status_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_state("A1", "R1");
    let orchestrator = orchestrator(&server, session);

    let error = orchestrator
        .call(Method::GET, "/reports", RequestBody::Empty)
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Not Found");
    assert_eq!(error.status(), Some(404));
}
