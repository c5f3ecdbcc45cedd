//! Client library for the SJWG AI Reporter service
//!
//! The core is the session/token lifecycle and the auth-aware request
//! orchestration on top of it: tokens are persisted across restarts,
//! injected into protected calls, transparently refreshed once on expiry,
//! and the session is torn down when refresh fails too. Higher-level
//! workflows (login, register, upload, delete, list) sequence orchestrated
//! calls and recover from partial failure.

pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod session;
pub mod types;
pub mod workflow;

pub use config::{ApiConfig, ClientConfig, LoggingConfig, StorageBackend, StorageConfig};
pub use credentials::{CredentialStore, FileStore, KeyringStore, MemoryStore};
pub use error::{ClientError, Result};
pub use http::{RequestBody, RequestClient};
pub use orchestrator::AuthOrchestrator;
pub use session::{Session, SessionState};
pub use types::{RefreshedToken, Report, ReportStatus, TokenPair, UploadReceipt};
pub use workflow::WorkflowController;
