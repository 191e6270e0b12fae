//! Error types for routing.

use thiserror::Error;

/// Errors that can occur while configuring or driving routing.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// A keyword could not be compiled into a pattern.
    #[error("invalid keyword pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The agent is not in the registry.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    /// A confirmation is already pending.
    #[error("a confirmation is already pending")]
    ConfirmationPending,

    /// There is no pending confirmation to answer.
    #[error("no confirmation is pending")]
    NoPendingConfirmation,
}

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, RoutingError>;
