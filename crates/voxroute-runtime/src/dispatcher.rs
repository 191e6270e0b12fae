//! Fallback dispatch across an ordered list of backends.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use voxroute_models::{
    AgentId, AttemptOutcome, AttemptRecord, BackendRequest, DispatchResult, RoutingDecision,
    RoutingMode, SessionId,
};

use crate::backend::Backend;
use crate::config::DispatchConfig;
use crate::error::{Result, RuntimeError};

const PRIMARY_LABEL: &str = "primary";

/// Builds the backend request for a decision.
///
/// The context carries `agent`, `routing_basis`, `mode`, `confidence`, and
/// `universal_command` when one was spoken.
pub fn build_request(
    decision: &RoutingDecision,
    session_id: &SessionId,
    mode: RoutingMode,
    universal_command: Option<&str>,
) -> BackendRequest {
    let command = decision.command();
    let mut context = HashMap::new();
    context.insert("agent".to_string(), decision.target().as_str().into());
    context.insert(
        "routing_basis".to_string(),
        decision.basis().decision_label().into(),
    );
    context.insert("mode".to_string(), mode.as_str().into());
    context.insert("confidence".to_string(), f64::from(command.confidence).into());
    if let Some(universal) = universal_command {
        context.insert("universal_command".to_string(), universal.into());
    }

    BackendRequest {
        message: command.transcript.clone(),
        session_id: session_id.clone(),
        context,
    }
}

/// The user-facing reply when every backend failed.
pub fn apology(agent: &AgentId) -> String {
    format!(
        "I'm sorry, I couldn't reach {} right now. Please try again in a moment.",
        agent.display_name()
    )
}

/// Resolves once `cancel` reads true. Never resolves if the sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Sends decisions to the primary backend, then each fallback in order.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use voxroute_runtime::{DispatchConfig, Dispatcher, EchoBackend};
///
/// let dispatcher = Dispatcher::new(Arc::new(EchoBackend::new()), DispatchConfig::default())
///     .with_fallback(Arc::new(EchoBackend::new()));
/// assert_eq!(dispatcher.labels(), vec!["primary", "fallback-1"]);
/// ```
pub struct Dispatcher {
    backends: Vec<(String, Arc<dyn Backend>)>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with only a primary backend.
    pub fn new(primary: Arc<dyn Backend>, config: DispatchConfig) -> Self {
        Self {
            backends: vec![(PRIMARY_LABEL.to_string(), primary)],
            config,
        }
    }

    /// Appends a fallback, labelled `fallback-N` by position.
    pub fn with_fallback(mut self, backend: Arc<dyn Backend>) -> Self {
        let label = format!("fallback-{}", self.backends.len());
        self.backends.push((label, backend));
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Position labels in dispatch order.
    pub fn labels(&self) -> Vec<&str> {
        self.backends.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// Dispatches a gated decision.
    ///
    /// Stops at the first success. Every attempt gets its own timeout; a
    /// failure or timeout moves on to the next backend. When `cancel` turns
    /// true the in-flight attempt is dropped and the result is marked
    /// cancelled.
    pub async fn dispatch(
        &self,
        decision: &RoutingDecision,
        request: &BackendRequest,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<DispatchResult> {
        if decision.is_blocked() {
            return Err(RuntimeError::Blocked(decision.target().to_string()));
        }

        let agent = decision.target().clone();
        let timeout = self.config.attempt_timeout;
        let mut attempts = Vec::with_capacity(self.backends.len());

        for (label, backend) in &self.backends {
            if *cancel.borrow() {
                return Ok(Self::cancelled_result(agent, attempts));
            }

            debug!(backend = %label, name = backend.name(), agent = %agent, "dispatch attempt");
            let started = Instant::now();
            let attempt = tokio::time::timeout(timeout, backend.send(request));

            let outcome = tokio::select! {
                biased;
                _ = cancelled(cancel) => None,
                result = attempt => Some(result),
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let mut record = |outcome: AttemptOutcome| {
                attempts.push(AttemptRecord {
                    backend: label.clone(),
                    backend_name: backend.name().to_string(),
                    outcome,
                    elapsed_ms,
                });
            };

            match outcome {
                None => {
                    info!(backend = %label, agent = %agent, "dispatch cancelled");
                    record(AttemptOutcome::Cancelled);
                    return Ok(Self::cancelled_result(agent, attempts));
                }
                Some(Ok(Ok(response))) => {
                    info!(backend = %label, agent = %agent, elapsed_ms, "dispatch succeeded");
                    record(AttemptOutcome::Succeeded);
                    return Ok(DispatchResult {
                        success: true,
                        response: response.text,
                        source_backend: Some(label.clone()),
                        agent,
                        attempts,
                        cancelled: false,
                    });
                }
                Some(Ok(Err(e))) => {
                    warn!(backend = %label, agent = %agent, error = %e, "dispatch attempt failed");
                    record(AttemptOutcome::Failed {
                        reason: e.to_string(),
                    });
                }
                Some(Err(_)) => {
                    let after_ms = timeout.as_millis() as u64;
                    warn!(backend = %label, agent = %agent, after_ms, "dispatch attempt timed out");
                    record(AttemptOutcome::TimedOut { after_ms });
                }
            }
        }

        warn!(agent = %agent, attempts = attempts.len(), "all backends failed");
        Ok(DispatchResult {
            success: false,
            response: apology(&agent),
            source_backend: None,
            agent,
            attempts,
            cancelled: false,
        })
    }

    fn cancelled_result(agent: AgentId, attempts: Vec<AttemptRecord>) -> DispatchResult {
        DispatchResult {
            success: false,
            response: String::new(),
            source_backend: None,
            agent,
            attempts,
            cancelled: true,
        }
    }
}
