//! Backend request/response shapes and dispatch results.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agent::AgentId;
use crate::ids::SessionId;

/// Request sent to a backend, once per attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    /// The command transcript.
    pub message: String,
    /// Voice session the command belongs to.
    pub session_id: SessionId,
    /// Routing context (target agent, basis, mode, confidence, ...).
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}

impl BackendRequest {
    /// Returns the target agent recorded in the context, if any.
    pub fn agent(&self) -> Option<AgentId> {
        self.context
            .get("agent")
            .and_then(|v| v.as_str())
            .map(AgentId::new)
    }
}

/// Response returned by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendResponse {
    /// Text to surface (and speak) to the user.
    pub text: String,
    /// Agent that produced the answer.
    pub agent_id: AgentId,
}

/// How a single backend attempt ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed { reason: String },
    TimedOut { after_ms: u64 },
    Cancelled,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Succeeded)
    }

    /// Short reason for failed outcomes.
    pub fn reason(&self) -> Option<String> {
        match self {
            AttemptOutcome::Succeeded => None,
            AttemptOutcome::Failed { reason } => Some(reason.clone()),
            AttemptOutcome::TimedOut { after_ms } => Some(format!("timed out after {}ms", after_ms)),
            AttemptOutcome::Cancelled => Some("cancelled".to_string()),
        }
    }
}

/// One backend attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Position label: `primary`, `fallback-1`, `fallback-2`, ...
    pub backend: String,
    /// Name the backend reports for itself.
    pub backend_name: String,
    pub outcome: AttemptOutcome,
    pub elapsed_ms: u64,
}

/// Final result of dispatching one routing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub success: bool,
    /// Backend answer on success, apology otherwise.
    pub response: String,
    /// Label of the backend that answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_backend: Option<String>,
    /// Agent the request was routed to.
    pub agent: AgentId,
    /// Every attempt in order.
    pub attempts: Vec<AttemptRecord>,
    /// True if the interface closed before a backend answered.
    #[serde(default)]
    pub cancelled: bool,
}

impl DispatchResult {
    /// Attempts that did not succeed.
    pub fn failed_attempts(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.attempts.iter().filter(|a| !a.outcome.is_success())
    }

    /// Wall time spent across all attempts.
    pub fn duration_ms(&self) -> u64 {
        self.attempts.iter().map(|a| a.elapsed_ms).sum()
    }

    /// Aggregated failure reason across all failed attempts.
    pub fn failure_summary(&self) -> Option<String> {
        let parts: Vec<String> = self
            .failed_attempts()
            .filter_map(|a| a.outcome.reason().map(|r| format!("{}: {}", a.backend, r)))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}
