//! Error types for the runtime crate.

use thiserror::Error;

/// Why a single backend attempt failed.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered with something we can't use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Backend refused the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors that prevent a dispatch from starting.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Blocked decisions are never dispatched.
    #[error("decision for {0} is blocked")]
    Blocked(String),

    /// Backend URL could not be used.
    #[error("invalid backend url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
