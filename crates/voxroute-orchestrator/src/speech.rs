//! Text-to-speech output.

use tracing::debug;
use voxroute_models::{AgentId, AgentKind};

/// Fire-and-forget speech output.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str, agent: &AgentId);
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeech;

impl SpeechSink for SilentSpeech {
    fn speak(&self, text: &str, agent: &AgentId) {
        debug!(agent = %agent, chars = text.len(), "speech suppressed");
    }
}

/// Announcement made when the dispatch target changes.
pub fn identity_confirmation(agent: &AgentId, kind: AgentKind) -> String {
    match kind {
        AgentKind::Local => format!("You're speaking with {}.", agent.display_name()),
        AgentKind::External => format!("You're speaking with {} now.", agent.display_name()),
    }
}
