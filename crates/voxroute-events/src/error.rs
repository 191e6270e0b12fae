//! Error types for audit operations.

use thiserror::Error;
use voxroute_persistence::PersistenceError;

/// Errors that can occur while reading the audit log.
///
/// Recording never fails; these only surface from replay.
#[derive(Error, Debug)]
pub enum EventError {
    /// Persistence error.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, EventError>;
