//! HTTP request client - builds calls against the configured base address
//! and normalizes failures into the crate error shape

use crate::{ClientError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Default base address when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Request payload. `Form` becomes URL-encoded form data; `File` becomes a
/// multipart body with the transport choosing the boundary.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Form(Vec<(&'static str, String)>),
    File { file_name: String, bytes: Vec<u8> },
}

/// Error body shape returned by the server on failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Thin client over reqwest with a fixed base address.
#[derive(Clone)]
pub struct RequestClient {
    client: Client,
    base_url: String,
}

impl RequestClient {
    /// Create a client. The base URL must be absolute; a trailing slash is
    /// trimmed so paths can always start with one.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a call. 204 yields `None`, any other 2xx yields the parsed
    /// JSON body. Non-2xx responses become `ClientError::Api` (or
    /// `AuthExpired` for 401) with the server's `detail` message when one can
    /// be parsed, falling back to the status reason.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        headers: HeaderMap,
    ) -> Result<Option<Value>> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "sending request");

        let mut request = self.client.request(method, &url);
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Form(pairs) => request.form(&pairs),
            RequestBody::File { file_name, bytes } => {
                let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                request.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        // Caller headers are applied last so they take precedence.
        let response = request.headers(headers).send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if status.is_success() {
            let value = response.json().await?;
            return Ok(Some(value));
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(ErrorBody {
                detail: Some(detail),
            }) => detail,
            _ => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };

        tracing::debug!(%url, status = status.as_u16(), "request failed: {}", message);
        Err(ClientError::api(message, status.as_u16()))
    }
}

/// Header map carrying `Authorization: Bearer <token>`.
pub(crate) fn bearer_headers(access_token: &str) -> Result<HeaderMap> {
    let value = HeaderValue::from_str(&format!("Bearer {access_token}"))
        .map_err(|_| ClientError::InvalidOperation("access token is not header-safe".to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}
