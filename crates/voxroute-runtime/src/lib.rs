//! Backend dispatch for routed voice commands.
//!
//! A [`Dispatcher`] sends a gated routing decision to the primary
//! [`Backend`] and walks the fallback chain on failure or timeout. Each
//! attempt has its own timeout and the whole dispatch can be cancelled
//! through a `watch` channel when the voice interface closes.

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod error;

pub use backend::{Backend, EchoBackend, HttpBackend};
pub use config::DispatchConfig;
pub use dispatcher::{apology, build_request, Dispatcher};
pub use error::{BackendError, Result, RuntimeError};
