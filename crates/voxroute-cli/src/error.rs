//! Error type for the console binary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] voxroute_core::ConfigError),

    #[error(transparent)]
    Orchestrator(#[from] voxroute_orchestrator::OrchestratorError),

    #[error("runtime error: {0}")]
    Runtime(#[from] voxroute_runtime::RuntimeError),

    #[error("audit error: {0}")]
    Audit(#[from] voxroute_events::EventError),

    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
