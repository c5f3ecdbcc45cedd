//! Error types for the AI Reporter client

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Structured failure returned by the server (non-2xx with a parsed or
    /// synthesized message).
    #[error("{message}")]
    Api { message: String, status: u16 },

    /// The access token was rejected (HTTP 401). Distinguished from `Api` so
    /// the orchestrator can trigger its refresh-and-retry path.
    #[error("{message}")]
    AuthExpired { message: String },

    /// The refresh endpoint itself rejected the refresh token.
    #[error("token refresh denied: {0}")]
    RefreshDenied(String),

    /// A protected call was attempted without a session.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("credential storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl ClientError {
    /// Build the uniform error for a non-2xx response, routing 401 to the
    /// `AuthExpired` variant.
    pub fn api(message: impl Into<String>, status: u16) -> Self {
        let message = message.into();
        if status == 401 {
            ClientError::AuthExpired { message }
        } else {
            ClientError::Api { message, status }
        }
    }

    /// Whether this failure is specifically an authentication failure.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ClientError::AuthExpired { .. })
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::AuthExpired { .. } => Some(401),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_routing() {
        let err = ClientError::api("Invalid credentials", 401);
        assert!(err.is_auth_expired());
        assert_eq!(err.status(), Some(401));

        let err = ClientError::api("Report not found", 404);
        assert!(!err.is_auth_expired());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Report not found");
    }

    #[test]
    fn test_non_http_errors_carry_no_status() {
        assert_eq!(ClientError::NotAuthenticated.status(), None);
        assert_eq!(
            ClientError::RefreshDenied("expired".to_string()).status(),
            None
        );
    }
}
