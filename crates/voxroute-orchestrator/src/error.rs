//! Error types for the orchestrator.

use thiserror::Error;

/// Orchestrator-specific errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Speech recognition reported an error. Nothing was routed.
    #[error("recognition error: {code}")]
    Recognition { code: String },

    /// Routing error.
    #[error("routing error: {0}")]
    Routing(#[from] voxroute_routing::RoutingError),

    /// Dispatch could not start.
    #[error("runtime error: {0}")]
    Runtime(#[from] voxroute_runtime::RuntimeError),

    /// Preferences could not be saved or loaded.
    #[error("persistence error: {0}")]
    Persistence(#[from] voxroute_persistence::PersistenceError),

    /// Audit log could not be read.
    #[error("audit error: {0}")]
    Audit(#[from] voxroute_events::EventError),

    /// There is no deference suggestion to accept.
    #[error("no suggestion to accept")]
    NoSuggestion,

    /// The pipeline task has stopped.
    #[error("voice session closed")]
    SessionClosed,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
