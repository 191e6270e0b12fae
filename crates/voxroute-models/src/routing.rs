//! Routing modes and decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::{AgentId, AgentKind};
use crate::command::VoiceCommand;

/// How the target agent is chosen for each command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Target inferred per command from wake words or the active agent.
    #[default]
    Agnostic,
    /// Every command goes to the pinned agent.
    Isolated,
}

impl RoutingMode {
    /// Returns the other mode.
    pub fn toggled(self) -> Self {
        match self {
            RoutingMode::Agnostic => RoutingMode::Isolated,
            RoutingMode::Isolated => RoutingMode::Agnostic,
        }
    }

    /// Returns the lowercase label used in logs and audit payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::Agnostic => "agnostic",
            RoutingMode::Isolated => "isolated",
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "agnostic" => Ok(RoutingMode::Agnostic),
            "isolated" | "pinned" => Ok(RoutingMode::Isolated),
            other => Err(format!("unknown routing mode: {}", other)),
        }
    }
}

/// Why a particular target was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingBasis {
    /// A local agent was named by wake word.
    WakeWordLocal,
    /// An external agent was named by wake word.
    WakeWordExternal,
    /// No agent was named; the active agent handles it.
    DelegatedToActive,
    /// Isolated mode sent it to the pinned agent.
    Isolated,
}

impl RoutingBasis {
    /// Returns the routing decision label recorded in voice session logs.
    pub fn decision_label(&self) -> &'static str {
        match self {
            RoutingBasis::WakeWordLocal => "local_agent_detected",
            RoutingBasis::WakeWordExternal => "external_agent_detected",
            RoutingBasis::DelegatedToActive => "delegated_to_active",
            RoutingBasis::Isolated => "isolated_mode",
        }
    }
}

impl fmt::Display for RoutingBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.decision_label())
    }
}

/// The routing outcome for one command.
///
/// Created by the resolver, finalized by the safety gate before it leaves
/// the pipeline, and immutable afterwards: fields are only readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    command: VoiceCommand,
    target: AgentId,
    target_kind: AgentKind,
    basis: RoutingBasis,
    blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_reason: Option<String>,
    decided_at: DateTime<Utc>,
}

impl RoutingDecision {
    /// Creates an unblocked decision.
    pub fn new(
        command: VoiceCommand,
        target: AgentId,
        target_kind: AgentKind,
        basis: RoutingBasis,
    ) -> Self {
        Self {
            command,
            target,
            target_kind,
            basis,
            blocked: false,
            block_reason: None,
            decided_at: Utc::now(),
        }
    }

    /// Consumes the decision and returns it marked as blocked.
    pub fn into_blocked(mut self, reason: impl Into<String>) -> Self {
        self.blocked = true;
        self.block_reason = Some(reason.into());
        self
    }

    pub fn command(&self) -> &VoiceCommand {
        &self.command
    }

    pub fn target(&self) -> &AgentId {
        &self.target
    }

    pub fn target_kind(&self) -> AgentKind {
        self.target_kind
    }

    pub fn basis(&self) -> RoutingBasis {
        self.basis
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.block_reason.as_deref()
    }

    pub fn decided_at(&self) -> DateTime<Utc> {
        self.decided_at
    }
}

/// Non-binding advice that another agent fits the request better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferenceSuggestion {
    /// Agent the advisor would route to.
    pub suggested_agent: AgentId,
    /// Human-readable explanation.
    pub reason: String,
    /// Heuristic confidence in `[0, 1]`.
    pub confidence: f32,
}

/// User-controlled routing preferences.
///
/// Written by mode toggles and snapshotted at the start of each command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoutingPreferences {
    #[serde(default)]
    pub mode: RoutingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_agent: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_agent: Option<AgentId>,
    #[serde(default)]
    pub external_enabled: bool,
}

impl RoutingPreferences {
    /// Pins an agent and switches to isolated mode.
    pub fn pin(&mut self, agent: AgentId) {
        self.pinned_agent = Some(agent);
        self.mode = RoutingMode::Isolated;
    }

    /// Clears the pin and switches back to agnostic mode.
    pub fn unpin(&mut self) {
        self.pinned_agent = None;
        self.mode = RoutingMode::Agnostic;
    }

    /// Switches modes. Entering isolated mode without a pin pins the active
    /// agent, or `fallback` when there is none.
    pub fn set_mode(&mut self, mode: RoutingMode, fallback: &AgentId) {
        match mode {
            RoutingMode::Isolated => {
                let agent = self
                    .pinned_agent
                    .clone()
                    .or_else(|| self.active_agent.clone())
                    .unwrap_or_else(|| fallback.clone());
                self.pin(agent);
            }
            RoutingMode::Agnostic => self.unpin(),
        }
    }
}
