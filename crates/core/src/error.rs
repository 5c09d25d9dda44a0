//! Error types for the pagetrack domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

use crate::event::EventType;

/// The top-level error type for pagetrack operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Collector errors ---
    #[error("Collector error: {0}")]
    Collector(#[from] CollectorError),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the remote collector (or the diagnostic sink).
#[derive(Debug, Clone, Error)]
pub enum CollectorError {
    /// The request could not be built or issued at all.
    #[error("Request could not be issued: {0}")]
    Request(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Collector rejected request (status: {status_code}): {body}")]
    Status { status_code: u16, body: String },

    #[error("Malformed collector response: {0}")]
    MalformedResponse(String),

    #[error("Collector unavailable: {0}")]
    Unavailable(String),
}

/// Outcomes of interpreting a command that did not lead to a request.
///
/// Everything except [`DispatchError::Fault`] is terminal: the command is
/// logged and dropped. A fault is transient and the command is deferred.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Malformed command: {0}")]
    Malformed(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("{event} event rejected: {reason}")]
    Rejected { event: EventType, reason: String },

    #[error("Handler fault in {method}: {reason}")]
    Fault { method: String, reason: String },
}

impl DispatchError {
    /// Whether the command that produced this error should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }
}
