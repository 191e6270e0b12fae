//! Safety gate: external-agent blocking and confirmation flagging.

use std::sync::Arc;

use tracing::{debug, warn};
use voxroute_models::{AgentId, RoutingDecision};

use crate::error::Result;
use crate::normalizer::normalize;
use crate::patterns::{first_match, KeywordPattern};

/// Where the user enables external agents.
pub const EXTERNAL_SETTING_PATH: &str = "Core → Settings → External Agents → Voice Interaction";

/// State-mutating verbs that require confirmation by default.
pub const DEFAULT_CONFIRMATION_KEYWORDS: &[&str] = &[
    "save",
    "delete",
    "send",
    "remove",
    "erase",
    "wipe",
    "purge",
    "reset",
    "kill switch",
];

/// User-facing explanation for a blocked external agent.
pub fn external_block_message(agent: &AgentId) -> String {
    format!(
        "External agent {} is not enabled. Please enable in {}.",
        agent, EXTERNAL_SETTING_PATH
    )
}

/// Decides whether a command needs explicit confirmation before dispatch.
pub trait ConfirmationPolicy: Send + Sync {
    fn requires_confirmation(&self, decision: &RoutingDecision) -> bool;
}

/// Requires confirmation when the transcript contains a sensitive keyword.
#[derive(Debug, Clone)]
pub struct KeywordConfirmationPolicy {
    keywords: Vec<KeywordPattern>,
}

impl KeywordConfirmationPolicy {
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            keywords: KeywordPattern::compile_all(keywords)?,
        })
    }

    /// Policy over [`DEFAULT_CONFIRMATION_KEYWORDS`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_CONFIRMATION_KEYWORDS)
    }
}

impl ConfirmationPolicy for KeywordConfirmationPolicy {
    fn requires_confirmation(&self, decision: &RoutingDecision) -> bool {
        let normalized = normalize(&decision.command().transcript);
        match first_match(&self.keywords, normalized.as_str()) {
            Some(keyword) => {
                debug!(keyword, agent = %decision.target(), "confirmation keyword");
                true
            }
            None => false,
        }
    }
}

/// Policy that never asks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl ConfirmationPolicy for NeverConfirm {
    fn requires_confirmation(&self, _decision: &RoutingDecision) -> bool {
        false
    }
}

/// Outcome of gating one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateVerdict {
    pub allowed: bool,
    pub requires_confirmation: bool,
    pub block_reason: Option<String>,
}

impl GateVerdict {
    fn allow(requires_confirmation: bool) -> Self {
        Self {
            allowed: true,
            requires_confirmation,
            block_reason: None,
        }
    }

    fn block(reason: String) -> Self {
        Self {
            allowed: false,
            requires_confirmation: false,
            block_reason: Some(reason),
        }
    }
}

/// Vetoes disabled external targets and flags sensitive commands.
#[derive(Clone)]
pub struct SafetyGate {
    policy: Arc<dyn ConfirmationPolicy>,
}

impl SafetyGate {
    pub fn new(policy: Arc<dyn ConfirmationPolicy>) -> Self {
        Self { policy }
    }

    /// Evaluates a decision without changing it.
    pub fn gate(&self, decision: &RoutingDecision, external_enabled: bool) -> GateVerdict {
        if decision.target_kind().is_external() && !external_enabled {
            warn!(agent = %decision.target(), "external agent blocked");
            return GateVerdict::block(external_block_message(decision.target()));
        }
        GateVerdict::allow(self.policy.requires_confirmation(decision))
    }

    /// Evaluates a decision and returns it finalized: blocked decisions come
    /// back marked with the block reason.
    pub fn finalize(
        &self,
        decision: RoutingDecision,
        external_enabled: bool,
    ) -> (RoutingDecision, GateVerdict) {
        let verdict = self.gate(&decision, external_enabled);
        let decision = match &verdict.block_reason {
            Some(reason) => decision.into_blocked(reason.clone()),
            None => decision,
        };
        (decision, verdict)
    }
}

impl Default for SafetyGate {
    fn default() -> Self {
        Self::new(Arc::new(NeverConfirm))
    }
}

impl std::fmt::Debug for SafetyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyGate").finish_non_exhaustive()
    }
}
