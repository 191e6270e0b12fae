//! Confirmation requests for sensitive commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::AgentId;
use crate::command::VoiceCommand;
use crate::ids::ConfirmationId;

/// Lifecycle state of a confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationState {
    /// Awaiting an explicit answer.
    #[default]
    Pending,
    /// Affirmed; the original command is dispatched.
    Confirmed,
    /// Denied or superseded; terminal, nothing dispatched.
    Declined,
}

/// How a pending request left the `Pending` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationResolution {
    /// Explicit affirmative answer.
    Affirmed,
    /// Explicit negative answer.
    Denied,
    /// A newer command arrived first.
    Superseded,
}

impl ConfirmationResolution {
    /// Returns the state this resolution leads to.
    pub fn target_state(&self) -> ConfirmationState {
        match self {
            ConfirmationResolution::Affirmed => ConfirmationState::Confirmed,
            ConfirmationResolution::Denied | ConfirmationResolution::Superseded => {
                ConfirmationState::Declined
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationResolution::Affirmed => "affirmed",
            ConfirmationResolution::Denied => "denied",
            ConfirmationResolution::Superseded => "superseded",
        }
    }
}

impl fmt::Display for ConfirmationResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sensitive command held until the user answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    id: ConfirmationId,
    original_command: VoiceCommand,
    proposed_target: AgentId,
    state: ConfirmationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<ConfirmationResolution>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_at: Option<DateTime<Utc>>,
}

impl ConfirmationRequest {
    /// Opens a new pending request.
    pub fn new(original_command: VoiceCommand, proposed_target: AgentId) -> Self {
        Self {
            id: ConfirmationId::new(),
            original_command,
            proposed_target,
            state: ConfirmationState::Pending,
            resolution: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Moves a pending request to its terminal state.
    ///
    /// Returns false (and changes nothing) if the request was already resolved.
    pub fn resolve(&mut self, resolution: ConfirmationResolution) -> bool {
        if self.state != ConfirmationState::Pending {
            return false;
        }
        self.state = resolution.target_state();
        self.resolution = Some(resolution);
        self.resolved_at = Some(Utc::now());
        true
    }

    pub fn id(&self) -> &ConfirmationId {
        &self.id
    }

    pub fn original_command(&self) -> &VoiceCommand {
        &self.original_command
    }

    pub fn proposed_target(&self) -> &AgentId {
        &self.proposed_target
    }

    pub fn state(&self) -> ConfirmationState {
        self.state
    }

    pub fn resolution(&self) -> Option<ConfirmationResolution> {
        self.resolution
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    pub fn is_pending(&self) -> bool {
        self.state == ConfirmationState::Pending
    }
}
