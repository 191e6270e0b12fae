//! Pipeline configuration.

use voxroute_events::DEFAULT_BREADCRUMB_CAP;

/// Configuration for a [`VoicePipeline`](crate::VoicePipeline).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Treat short yes/no utterances as answers to a pending confirmation.
    pub voice_confirmation: bool,
    /// Announce the agent whenever the dispatch target changes.
    pub identity_confirmation: bool,
    /// Number of breadcrumbs kept.
    pub breadcrumb_cap: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            voice_confirmation: true,
            identity_confirmation: true,
            breadcrumb_cap: DEFAULT_BREADCRUMB_CAP,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voice_confirmation(mut self, enabled: bool) -> Self {
        self.voice_confirmation = enabled;
        self
    }

    pub fn with_identity_confirmation(mut self, enabled: bool) -> Self {
        self.identity_confirmation = enabled;
        self
    }

    pub fn with_breadcrumb_cap(mut self, cap: usize) -> Self {
        self.breadcrumb_cap = cap;
        self
    }
}
