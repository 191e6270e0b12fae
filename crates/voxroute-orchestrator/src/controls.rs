//! Routing preference writes.
//!
//! Mode toggles, pins, the active agent and the external-agent switch are
//! configuration writes. The pipeline snapshots them at the start of each
//! command, so a change applies to the next command only.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};
use voxroute_models::{AgentId, RoutingMode, RoutingPreferences};
use voxroute_persistence::PreferencesStore;
use voxroute_routing::{AgentRegistry, RoutingError, StaticAgentRegistry};

use crate::error::Result;

/// Shared handle for changing routing preferences.
#[derive(Clone)]
pub struct RoutingControls {
    inner: Arc<ControlsInner>,
}

struct ControlsInner {
    prefs: watch::Sender<RoutingPreferences>,
    registry: Arc<StaticAgentRegistry>,
    store: Option<PreferencesStore>,
    default_agent: AgentId,
}

impl RoutingControls {
    /// Creates controls over in-memory preferences.
    ///
    /// The registry's external switch is aligned with `initial`.
    pub fn new(
        registry: Arc<StaticAgentRegistry>,
        initial: RoutingPreferences,
        default_agent: impl Into<AgentId>,
    ) -> Self {
        Self::build(registry, initial, default_agent.into(), None)
    }

    /// Restores preferences from `store` and persists every later change.
    pub fn restore(
        registry: Arc<StaticAgentRegistry>,
        store: PreferencesStore,
        default_agent: impl Into<AgentId>,
    ) -> Result<Self> {
        let prefs = store.load()?;
        info!(
            path = %store.path().display(),
            mode = %prefs.mode,
            "restored routing preferences"
        );
        Ok(Self::build(registry, prefs, default_agent.into(), Some(store)))
    }

    fn build(
        registry: Arc<StaticAgentRegistry>,
        initial: RoutingPreferences,
        default_agent: AgentId,
        store: Option<PreferencesStore>,
    ) -> Self {
        registry.set_external_enabled(initial.external_enabled);
        let (prefs, _) = watch::channel(initial);
        Self {
            inner: Arc::new(ControlsInner {
                prefs,
                registry,
                store,
                default_agent,
            }),
        }
    }

    /// Current preferences.
    pub fn snapshot(&self) -> RoutingPreferences {
        self.inner.prefs.borrow().clone()
    }

    /// Receiver notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<RoutingPreferences> {
        self.inner.prefs.subscribe()
    }

    pub fn registry(&self) -> Arc<StaticAgentRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn default_agent(&self) -> &AgentId {
        &self.inner.default_agent
    }

    pub fn set_mode(&self, mode: RoutingMode) -> Result<RoutingPreferences> {
        let fallback = self.inner.default_agent.clone();
        self.update(|prefs| prefs.set_mode(mode, &fallback))
    }

    /// Flips between agnostic and isolated mode and returns the new mode.
    pub fn toggle_mode(&self) -> Result<RoutingMode> {
        let mode = self.snapshot().mode.toggled();
        Ok(self.set_mode(mode)?.mode)
    }

    /// Pins a registered agent and enters isolated mode.
    pub fn pin(&self, agent: impl Into<AgentId>) -> Result<RoutingPreferences> {
        let agent = self.known(agent.into())?;
        self.update(|prefs| prefs.pin(agent))
    }

    pub fn unpin(&self) -> Result<RoutingPreferences> {
        self.update(RoutingPreferences::unpin)
    }

    /// Sets the agent that receives commands without a wake word.
    pub fn set_active(&self, agent: impl Into<AgentId>) -> Result<RoutingPreferences> {
        let agent = self.known(agent.into())?;
        self.update(|prefs| prefs.active_agent = Some(agent))
    }

    /// Enables or disables dispatch to external agents.
    pub fn set_external(&self, enabled: bool) -> Result<RoutingPreferences> {
        self.inner.registry.set_external_enabled(enabled);
        self.update(|prefs| prefs.external_enabled = enabled)
    }

    fn known(&self, agent: AgentId) -> Result<AgentId> {
        match self.inner.registry.kind_of(&agent) {
            Some(_) => Ok(agent),
            None => Err(RoutingError::UnknownAgent(agent.to_string()).into()),
        }
    }

    fn update<F>(&self, change: F) -> Result<RoutingPreferences>
    where
        F: FnOnce(&mut RoutingPreferences),
    {
        self.inner.prefs.send_modify(change);
        let prefs = self.snapshot();
        info!(
            mode = %prefs.mode,
            pinned = prefs.pinned_agent.as_ref().map(|a| a.as_str()),
            active = prefs.active_agent.as_ref().map(|a| a.as_str()),
            external_enabled = prefs.external_enabled,
            "routing preferences updated"
        );

        if let Some(store) = &self.inner.store {
            if let Err(e) = store.save(&prefs) {
                warn!(error = %e, "failed to persist routing preferences");
                return Err(e.into());
            }
        }
        Ok(prefs)
    }
}

impl std::fmt::Debug for RoutingControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingControls")
            .field("prefs", &*self.inner.prefs.borrow())
            .field("default_agent", &self.inner.default_agent)
            .finish_non_exhaustive()
    }
}
