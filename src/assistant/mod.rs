//! Assistants API transport layer
//!
//! This module defines the contract between the turn orchestrator and the
//! remote "thread + run" conversational API. The [`AssistantApi`] trait is
//! the seam: the engine only ever talks to the trait, so tests can inject
//! scripted fakes while production wires in the HTTP client from [`http`].
//!
//! Every response body is parsed into a validated serde type; a payload
//! missing an expected field surfaces as [`AssistantError::Malformed`]
//! rather than a panic deep in field access.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

pub mod http;

pub use http::AssistantClient;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Errors surfaced by the transport client
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// The request never produced an HTTP response (DNS, connect, TLS, ...)
    #[error("network error during {operation}: {detail}")]
    Network {
        /// Operation that was being attempted
        operation: &'static str,
        /// Underlying transport detail
        detail: String,
    },

    /// The remote API answered with a non-2xx status
    #[error("{operation} failed ({status}): {message}")]
    Api {
        /// Operation that was being attempted
        operation: &'static str,
        /// HTTP status code
        status: u16,
        /// Remote-provided error message, or the HTTP status text
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("malformed {operation} response: {detail}")]
    Malformed {
        /// Operation that was being attempted
        operation: &'static str,
        /// What was missing or unparseable
        detail: String,
    },
}

/// Status of a remote run.
///
/// The orchestrator only distinguishes "still open" from "terminal", but the
/// literal status token is preserved so failure renderings can show exactly
/// what the remote reported, including statuses this engine does not model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RunStatus {
    /// Waiting to be scheduled
    Queued,

    /// Executing
    InProgress,

    /// Finished successfully; a reply message is available
    Completed,

    /// Finished with a remote error
    Failed,

    /// Cancelled remotely
    Cancelled,

    /// Exceeded the remote execution window
    Expired,

    /// Any status token this engine does not model (e.g. requires_action)
    Other(String),
}

impl RunStatus {
    /// True while the run is still queued or executing.
    ///
    /// Anything else is treated as terminal.
    pub fn is_open(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            "expired" => RunStatus::Expired,
            _ => RunStatus::Other(s),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Queued => write!(f, "queued"),
            RunStatus::InProgress => write!(f, "in_progress"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::Expired => write!(f, "expired"),
            RunStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Structured error a terminal run may carry
#[derive(Debug, Clone, Deserialize)]
pub struct RunLastError {
    /// Human-readable detail from the remote service
    pub message: String,

    /// Remote error code, when present
    #[serde(default)]
    pub code: Option<String>,
}

/// Point-in-time view of a remote run
#[derive(Debug, Clone, Deserialize)]
pub struct RunSnapshot {
    /// Opaque run identifier
    pub id: String,

    /// Current status token
    pub status: RunStatus,

    /// Structured error detail, populated on failed runs
    #[serde(default)]
    pub last_error: Option<RunLastError>,
}

/// Contract the orchestrator drives one turn through.
///
/// All identifiers are opaque strings owned by the remote service. No method
/// touches local state; callers own sequencing and retry policy.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Create a new conversation thread and return its identifier.
    async fn create_thread(&self) -> Result<String>;

    /// Append a user message to an existing thread.
    async fn post_user_message(&self, thread_id: &str, text: &str) -> Result<()>;

    /// Start a run over the thread using the configured assistant.
    async fn create_run(&self, thread_id: &str) -> Result<RunSnapshot>;

    /// Fetch the current snapshot of a run.
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunSnapshot>;

    /// Fetch the text of the newest message on the thread.
    ///
    /// Uses "most recent first, limit one" semantics and extracts the first
    /// text segment of the first returned message.
    async fn latest_assistant_text(&self, thread_id: &str) -> Result<String>;
}
