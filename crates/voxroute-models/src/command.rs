//! Recognized voice commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::CommandId;

/// Confidence attached to typed input or providers that do not report one.
pub const DEFAULT_CONFIDENCE: f32 = 0.8;

/// A single recognized utterance, consumed once by the routing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCommand {
    /// Unique identifier for the command.
    pub id: CommandId,
    /// Raw transcript as delivered by the speech-to-text provider.
    pub transcript: String,
    /// Recognition confidence in `[0, 1]`. Advisory only.
    pub confidence: f32,
    /// When the final transcript was received.
    pub received_at: DateTime<Utc>,
}

impl VoiceCommand {
    /// Creates a command received now.
    ///
    /// Confidence is clamped to `[0, 1]`; NaN becomes `0.0`.
    pub fn new(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            id: CommandId::new(),
            transcript: transcript.into(),
            confidence: clamp_confidence(confidence),
            received_at: Utc::now(),
        }
    }

    /// Creates a command with the default confidence.
    pub fn typed(transcript: impl Into<String>) -> Self {
        Self::new(transcript, DEFAULT_CONFIDENCE)
    }

    /// Returns true if the transcript holds no visible characters.
    pub fn is_blank(&self) -> bool {
        self.transcript.trim().is_empty()
    }
}

fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(VoiceCommand::new("hi", 1.7).confidence, 1.0);
        assert_eq!(VoiceCommand::new("hi", -0.2).confidence, 0.0);
        assert_eq!(VoiceCommand::new("hi", f32::NAN).confidence, 0.0);
        assert_eq!(VoiceCommand::new("hi", 0.42).confidence, 0.42);
    }

    #[test]
    fn test_typed_uses_default_confidence() {
        let cmd = VoiceCommand::typed("hello");
        assert_eq!(cmd.confidence, DEFAULT_CONFIDENCE);
        assert!(cmd.id.as_str().starts_with("cmd-"));
    }

    #[test]
    fn test_is_blank() {
        assert!(VoiceCommand::typed("   ").is_blank());
        assert!(!VoiceCommand::typed("help").is_blank());
    }
}
