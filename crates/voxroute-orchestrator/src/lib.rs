//! Voice command orchestration.
//!
//! Wires the routing pieces into one pipeline:
//!
//! - [`VoicePipeline`] resolves, gates, confirms and dispatches commands,
//!   auditing every step
//! - [`RoutingControls`] writes mode, pin, active agent and the external
//!   switch, optionally persisting them
//! - [`VoiceSession`] runs a pipeline on its own task, fed by [`SttEvent`]s

mod config;
mod controls;
mod error;
mod pipeline;
mod session;
mod speech;

pub use config::PipelineConfig;
pub use controls::RoutingControls;
pub use error::{OrchestratorError, Result};
pub use pipeline::{PipelineOutcome, PipelineResponse, VoicePipeline};
pub use session::{SessionSnapshot, SttEvent, VoiceSession};
pub use speech::{identity_confirmation, SilentSpeech, SpeechSink};
