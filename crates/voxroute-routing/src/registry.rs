//! Agent registry.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;
use voxroute_models::{AgentId, AgentKind};

/// Local agents shipped by default, in wake-word priority order.
pub const DEFAULT_LOCAL_AGENTS: &[&str] = &["alden", "alice", "mimic", "sentry"];

/// External agents shipped by default.
pub const DEFAULT_EXTERNAL_AGENTS: &[&str] = &["gemini-cli", "google-api", "trae-cli"];

/// Source of the agent lists and the external-agent switch.
///
/// List order is significant: it is the wake-word priority order.
pub trait AgentRegistry: Send + Sync {
    /// Local agents, always available.
    fn list_local(&self) -> Vec<AgentId>;

    /// External agents, available only while enabled.
    fn list_external(&self) -> Vec<AgentId>;

    /// Whether external agents may currently be dispatched to.
    fn is_external_enabled(&self) -> bool;

    /// Returns the kind of a registered agent.
    fn kind_of(&self, agent: &AgentId) -> Option<AgentKind> {
        if self.list_local().contains(agent) {
            Some(AgentKind::Local)
        } else if self.list_external().contains(agent) {
            Some(AgentKind::External)
        } else {
            None
        }
    }
}

/// Registry with a fixed agent list and a runtime external-agent switch.
///
/// # Example
///
/// ```
/// use voxroute_routing::{AgentRegistry, StaticAgentRegistry};
///
/// let registry = StaticAgentRegistry::default();
/// assert!(!registry.is_external_enabled());
///
/// registry.set_external_enabled(true);
/// assert!(registry.is_external_enabled());
/// ```
#[derive(Debug)]
pub struct StaticAgentRegistry {
    local: Vec<AgentId>,
    external: Vec<AgentId>,
    external_enabled: AtomicBool,
}

impl StaticAgentRegistry {
    /// Creates a registry with external agents disabled.
    pub fn new<L, E>(local: L, external: E) -> Self
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            local: local.into_iter().map(AgentId::new).collect(),
            external: external.into_iter().map(AgentId::new).collect(),
            external_enabled: AtomicBool::new(false),
        }
    }

    /// Sets the initial external-agent switch.
    pub fn with_external_enabled(self, enabled: bool) -> Self {
        self.external_enabled.store(enabled, Ordering::SeqCst);
        self
    }

    /// Flips the external-agent switch. Applies from the next command.
    pub fn set_external_enabled(&self, enabled: bool) {
        let previous = self.external_enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            info!(enabled, "external agents toggled");
        }
    }
}

impl Default for StaticAgentRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_AGENTS, DEFAULT_EXTERNAL_AGENTS)
    }
}

impl AgentRegistry for StaticAgentRegistry {
    fn list_local(&self) -> Vec<AgentId> {
        self.local.clone()
    }

    fn list_external(&self) -> Vec<AgentId> {
        self.external.clone()
    }

    fn is_external_enabled(&self) -> bool {
        self.external_enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = StaticAgentRegistry::default();
        assert_eq!(registry.list_local().len(), 4);
        assert_eq!(registry.list_local()[0].as_str(), "alden");
        assert_eq!(registry.list_external().len(), 3);
        assert!(!registry.is_external_enabled());
    }

    #[test]
    fn test_kind_of() {
        let registry = StaticAgentRegistry::default();
        assert_eq!(registry.kind_of(&AgentId::new("mimic")), Some(AgentKind::Local));
        assert_eq!(registry.kind_of(&AgentId::new("trae-cli")), Some(AgentKind::External));
        assert_eq!(registry.kind_of(&AgentId::new("nobody")), None);
    }

    #[test]
    fn test_external_switch() {
        let registry = StaticAgentRegistry::new(["alden"], ["gemini-cli"]).with_external_enabled(true);
        assert!(registry.is_external_enabled());
        registry.set_external_enabled(false);
        assert!(!registry.is_external_enabled());
    }
}
