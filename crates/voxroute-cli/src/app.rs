//! Wires settings, stores and backends into a running voice session.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use voxroute_core::RouterSettings;
use voxroute_events::AuditLogger;
use voxroute_models::AgentId;
use voxroute_orchestrator::{
    PipelineConfig, RoutingControls, SpeechSink, VoicePipeline, VoiceSession,
};
use voxroute_persistence::{JsonlAuditStore, PreferencesStore};
use voxroute_routing::{AgentRegistry, StaticAgentRegistry};
use voxroute_runtime::{DispatchConfig, Dispatcher, EchoBackend, HttpBackend};

use crate::error::{CliError, Result};

/// Prints spoken lines to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleSpeech;

impl SpeechSink for ConsoleSpeech {
    fn speak(&self, text: &str, agent: &AgentId) {
        println!("[{}] {}", agent.display_name(), text);
    }
}

/// Builds the dispatcher: HTTP backends when a primary URL is configured,
/// the echo backend otherwise.
pub fn build_dispatcher(settings: &RouterSettings, offline: bool) -> Result<Dispatcher> {
    let config = DispatchConfig::new().with_attempt_timeout(settings.attempt_timeout);

    let primary = match (&settings.primary_url, offline) {
        (Some(url), false) => url,
        _ => {
            info!("offline mode: using echo backend");
            return Ok(Dispatcher::new(Arc::new(EchoBackend::new()), config));
        }
    };

    let timeout = settings.attempt_timeout;
    let mut dispatcher = Dispatcher::new(
        Arc::new(HttpBackend::with_connect_timeout("primary", primary.clone(), timeout)?),
        config,
    );
    for (i, url) in settings.fallback_urls.iter().enumerate() {
        let backend =
            HttpBackend::with_connect_timeout(format!("fallback-{}", i + 1), url.clone(), timeout)?;
        dispatcher = dispatcher.with_fallback(Arc::new(backend));
    }
    Ok(dispatcher)
}

/// A running console session and the handles around it.
pub struct App {
    pub session: VoiceSession,
    pub audit: Arc<AuditLogger>,
    pub backends: Vec<String>,
}

impl App {
    /// Builds the pipeline and spawns its task. Must run inside a tokio
    /// runtime context.
    pub fn build(
        settings: &RouterSettings,
        state_dir: &Path,
        audit_dir: &Path,
        offline: bool,
    ) -> Result<Self> {
        let registry = Arc::new(StaticAgentRegistry::default());
        if registry.kind_of(&settings.default_agent).is_none() {
            return Err(CliError::InvalidArgument(format!(
                "default agent {} is not registered",
                settings.default_agent
            )));
        }

        let controls = RoutingControls::restore(
            registry,
            PreferencesStore::new(state_dir),
            settings.default_agent.clone(),
        )?;
        if settings.external_enabled && !controls.snapshot().external_enabled {
            controls.set_external(true)?;
        }

        let audit = Arc::new(AuditLogger::new(
            Arc::new(JsonlAuditStore::new(audit_dir)),
            settings.audit_buffer,
        ));

        let dispatcher = build_dispatcher(settings, offline)?;
        let backends = dispatcher.labels().iter().map(|l| l.to_string()).collect();

        let pipeline = VoicePipeline::new(
            dispatcher,
            Arc::clone(&audit),
            controls,
            Arc::new(ConsoleSpeech),
            PipelineConfig::new().with_breadcrumb_cap(settings.breadcrumb_cap),
        )?;

        Ok(Self {
            session: VoiceSession::spawn(pipeline),
            audit,
            backends,
        })
    }

    /// Flushes anything the audit logger is still holding.
    pub fn flush_audit(&self) {
        let pending = self.audit.buffered_len();
        if pending == 0 {
            return;
        }
        let flushed = self.audit.flush_buffered();
        if flushed < pending {
            warn!(pending, flushed, "audit events still buffered at exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online_settings() -> RouterSettings {
        RouterSettings {
            primary_url: Some("http://localhost:8000/agent".parse().unwrap()),
            fallback_urls: vec![
                "http://localhost:8001/agent".parse().unwrap(),
                "http://localhost:8002/agent".parse().unwrap(),
            ],
            ..RouterSettings::default()
        }
    }

    #[test]
    fn test_offline_dispatcher_uses_echo() {
        let dispatcher = build_dispatcher(&RouterSettings::default(), false).unwrap();
        assert_eq!(dispatcher.labels(), vec!["primary"]);
    }

    #[test]
    fn test_online_dispatcher_chain() {
        let dispatcher = build_dispatcher(&online_settings(), false).unwrap();
        assert_eq!(dispatcher.labels(), vec!["primary", "fallback-1", "fallback-2"]);
    }

    #[test]
    fn test_offline_flag_overrides_urls() {
        let dispatcher = build_dispatcher(&online_settings(), true).unwrap();
        assert_eq!(dispatcher.labels().len(), 1);
    }

    #[tokio::test]
    async fn test_build_rejects_unknown_default_agent() {
        let dir = tempfile::tempdir().unwrap();
        let settings = RouterSettings {
            default_agent: AgentId::new("nobody"),
            ..RouterSettings::default()
        };
        let result = App::build(&settings, dir.path(), &dir.path().join("audit"), true);
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_build_applies_external_setting() {
        let dir = tempfile::tempdir().unwrap();
        let settings = RouterSettings {
            external_enabled: true,
            ..RouterSettings::default()
        };
        let app = App::build(&settings, dir.path(), &dir.path().join("audit"), true).unwrap();
        assert!(app.session.controls().snapshot().external_enabled);
        assert_eq!(app.backends, vec!["primary".to_string()]);
        app.session.shutdown().await;
    }
}
