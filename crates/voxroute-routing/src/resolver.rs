//! Target agent resolution.

use tracing::debug;
use voxroute_models::{
    AgentId, AgentKind, RoutingBasis, RoutingDecision, RoutingMode, RoutingPreferences,
    VoiceCommand,
};

use crate::normalizer::normalize;
use crate::registry::AgentRegistry;

/// Snapshot of everything resolution depends on, taken once per command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutingContext {
    pub mode: RoutingMode,
    pub pinned_agent: Option<AgentId>,
    pub active_agent: Option<AgentId>,
    pub external_enabled: bool,
    pub local_agents: Vec<AgentId>,
    pub external_agents: Vec<AgentId>,
}

impl RoutingContext {
    /// Builds a snapshot from the current preferences and registry.
    pub fn snapshot(prefs: &RoutingPreferences, registry: &dyn AgentRegistry) -> Self {
        Self {
            mode: prefs.mode,
            pinned_agent: prefs.pinned_agent.clone(),
            active_agent: prefs.active_agent.clone(),
            external_enabled: registry.is_external_enabled(),
            local_agents: registry.list_local(),
            external_agents: registry.list_external(),
        }
    }

    /// Kind of an agent in this snapshot. Unregistered agents count as local.
    pub fn kind_of(&self, agent: &AgentId) -> AgentKind {
        if self.external_agents.contains(agent) {
            AgentKind::External
        } else {
            AgentKind::Local
        }
    }
}

/// Chooses the target agent for a command.
#[derive(Debug, Clone)]
pub struct AgentResolver {
    default_agent: AgentId,
}

impl AgentResolver {
    /// Creates a resolver falling back to `default_agent` when nothing
    /// else names a target.
    pub fn new(default_agent: impl Into<AgentId>) -> Self {
        Self {
            default_agent: default_agent.into(),
        }
    }

    pub fn default_agent(&self) -> &AgentId {
        &self.default_agent
    }

    /// Resolves the target for `command`.
    ///
    /// Isolated mode always goes to the pinned agent. Agnostic mode looks for
    /// a local wake word, then an external one, then delegates to the active
    /// agent. Wake-word ties are broken by registry order, not by where the
    /// agents appear in the utterance.
    pub fn resolve(&self, command: VoiceCommand, ctx: &RoutingContext) -> RoutingDecision {
        if ctx.mode == RoutingMode::Isolated {
            let target = ctx
                .pinned_agent
                .clone()
                .or_else(|| ctx.active_agent.clone())
                .unwrap_or_else(|| self.default_agent.clone());
            let kind = ctx.kind_of(&target);
            return RoutingDecision::new(command, target, kind, RoutingBasis::Isolated);
        }

        let normalized = normalize(&command.transcript);
        if !normalized.is_empty() {
            let candidates = normalized.wake_candidates();
            let named = |agents: &[AgentId]| {
                agents
                    .iter()
                    .find(|agent| candidates.iter().any(|c| c == agent.as_str()))
                    .cloned()
            };

            if let Some(agent) = named(&ctx.local_agents) {
                debug!(agent = %agent, "local wake word");
                return RoutingDecision::new(
                    command,
                    agent,
                    AgentKind::Local,
                    RoutingBasis::WakeWordLocal,
                );
            }

            // Scanned even while disabled so the gate can block it
            if let Some(agent) = named(&ctx.external_agents) {
                debug!(agent = %agent, enabled = ctx.external_enabled, "external wake word");
                return RoutingDecision::new(
                    command,
                    agent,
                    AgentKind::External,
                    RoutingBasis::WakeWordExternal,
                );
            }
        }

        let target = ctx
            .active_agent
            .clone()
            .unwrap_or_else(|| self.default_agent.clone());
        let kind = ctx.kind_of(&target);
        RoutingDecision::new(command, target, kind, RoutingBasis::DelegatedToActive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticAgentRegistry;

    fn context(mode: RoutingMode, external_enabled: bool) -> RoutingContext {
        let registry = StaticAgentRegistry::default().with_external_enabled(external_enabled);
        let prefs = RoutingPreferences {
            mode,
            ..Default::default()
        };
        RoutingContext::snapshot(&prefs, &registry)
    }

    fn resolve(transcript: &str, ctx: &RoutingContext) -> RoutingDecision {
        AgentResolver::new("alden").resolve(VoiceCommand::typed(transcript), ctx)
    }

    #[test]
    fn test_local_wake_word() {
        let ctx = context(RoutingMode::Agnostic, false);
        let decision = resolve("hey alden, what's my schedule", &ctx);
        assert_eq!(decision.target().as_str(), "alden");
        assert_eq!(decision.basis(), RoutingBasis::WakeWordLocal);
        assert_eq!(decision.target_kind(), AgentKind::Local);
        assert!(!decision.is_blocked());
    }

    #[test]
    fn test_comma_wake_word() {
        let ctx = context(RoutingMode::Agnostic, false);
        let decision = resolve("Mimic, rewrite this paragraph", &ctx);
        assert_eq!(decision.target().as_str(), "mimic");
        assert_eq!(decision.basis(), RoutingBasis::WakeWordLocal);
    }

    #[test]
    fn test_local_beats_later_external() {
        let ctx = context(RoutingMode::Agnostic, true);
        let decision = resolve("hey alice, then hey gemini-cli", &ctx);
        assert_eq!(decision.target().as_str(), "alice");
        assert_eq!(decision.basis(), RoutingBasis::WakeWordLocal);
    }

    #[test]
    fn test_local_beats_earlier_external() {
        let ctx = context(RoutingMode::Agnostic, true);
        let decision = resolve("hey trae-cli, or sentry, check this", &ctx);
        assert_eq!(decision.target().as_str(), "sentry");
    }

    #[test]
    fn test_registry_order_breaks_ties() {
        let ctx = context(RoutingMode::Agnostic, false);
        let decision = resolve("hey sentry, tell alden, hello", &ctx);
        assert_eq!(decision.target().as_str(), "alden");
    }

    #[test]
    fn test_external_wake_word_detected_while_disabled() {
        let ctx = context(RoutingMode::Agnostic, false);
        let decision = resolve("hey gemini-cli, summarize this", &ctx);
        assert_eq!(decision.target().as_str(), "gemini-cli");
        assert_eq!(decision.target_kind(), AgentKind::External);
        assert_eq!(decision.basis(), RoutingBasis::WakeWordExternal);
    }

    #[test]
    fn test_whole_word_agent_match() {
        let registry = StaticAgentRegistry::new(["alden"], ["gemini", "gemini-cli"]);
        let ctx = RoutingContext::snapshot(&RoutingPreferences::default(), &registry);
        let decision = resolve("hey gemini-cli, go", &ctx);
        assert_eq!(decision.target().as_str(), "gemini-cli");
    }

    #[test]
    fn test_delegates_to_active() {
        let mut ctx = context(RoutingMode::Agnostic, false);
        ctx.active_agent = Some(AgentId::new("alice"));
        let decision = resolve("how did the last session go", &ctx);
        assert_eq!(decision.target().as_str(), "alice");
        assert_eq!(decision.basis(), RoutingBasis::DelegatedToActive);
    }

    #[test]
    fn test_empty_transcript_delegates() {
        let ctx = context(RoutingMode::Agnostic, false);
        let decision = resolve("  ?! ", &ctx);
        assert_eq!(decision.target().as_str(), "alden");
        assert_eq!(decision.basis(), RoutingBasis::DelegatedToActive);
    }

    #[test]
    fn test_mention_without_wake_form_delegates() {
        let ctx = context(RoutingMode::Agnostic, false);
        let decision = resolve("ask alice about it", &ctx);
        assert_eq!(decision.basis(), RoutingBasis::DelegatedToActive);
        assert_eq!(decision.target().as_str(), "alden");
    }

    #[test]
    fn test_isolated_ignores_wake_words() {
        let mut ctx = context(RoutingMode::Isolated, true);
        ctx.pinned_agent = Some(AgentId::new("mimic"));
        let decision = resolve("hey alden, hey gemini-cli, schedule", &ctx);
        assert_eq!(decision.target().as_str(), "mimic");
        assert_eq!(decision.basis(), RoutingBasis::Isolated);
    }

    #[test]
    fn test_isolated_pinned_external_keeps_kind() {
        let mut ctx = context(RoutingMode::Isolated, false);
        ctx.pinned_agent = Some(AgentId::new("google-api"));
        let decision = resolve("anything", &ctx);
        assert_eq!(decision.target_kind(), AgentKind::External);
    }
}
