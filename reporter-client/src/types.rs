//! Wire types for the AI Reporter API

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A generated report as returned by `GET /reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub title: String,
    pub status: ReportStatus,
    /// Server emits naive ISO-8601 timestamps.
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub preview: Option<String>,
    /// Download path of the rendered PDF, when generation has finished. The
    /// single-report endpoint names this field `download_pdf`.
    #[serde(rename = "pdf_report", alias = "download_pdf", default)]
    pub pdf_url: Option<String>,
}

/// Report lifecycle status. `Processing` is set while the AI task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ReportStatus {
    /// Whether the server is done with this report, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Failed)
    }
}

/// Successful `POST /auth/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Successful `POST /auth/refresh` response. The refresh token is not
/// rotated, so only the access token comes back.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
}

/// `POST /upload` acknowledgement (202 Accepted). Generation continues
/// server-side; `check_status` points at the report resource to poll.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub report_id: i64,
    pub status: ReportStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub check_status: Option<String>,
}
