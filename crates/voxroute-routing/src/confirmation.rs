//! Single-slot confirmation tracking.

use tracing::info;
use voxroute_models::{AgentId, ConfirmationRequest, ConfirmationResolution, VoiceCommand};

use crate::error::{Result, RoutingError};
use crate::normalizer::normalize;

const AFFIRMATIVE_REPLIES: &[&str] = &["yes", "yeah", "yep", "confirm", "do it", "go ahead", "proceed"];
const NEGATIVE_REPLIES: &[&str] = &["no", "nope", "cancel", "stop", "never mind", "nevermind", "don't"];

// Longer utterances are treated as new commands.
const MAX_REPLY_WORDS: usize = 4;

/// How a spoken reply answers a pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Affirmative,
    Negative,
}

impl ReplyKind {
    pub fn resolution(self) -> ConfirmationResolution {
        match self {
            ReplyKind::Affirmative => ConfirmationResolution::Affirmed,
            ReplyKind::Negative => ConfirmationResolution::Denied,
        }
    }
}

/// Classifies a short utterance as a yes/no reply.
///
/// The reply must open the utterance, as in `"yes please"` or
/// `"no, never mind"`.
pub fn classify_reply(transcript: &str) -> Option<ReplyKind> {
    let normalized = normalize(transcript);
    let text = normalized.as_str().replace(',', " ");
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || words.len() > MAX_REPLY_WORDS {
        return None;
    }

    let opens_with = |phrase: &str| {
        let phrase_words: Vec<&str> = phrase.split(' ').collect();
        words.len() >= phrase_words.len() && words[..phrase_words.len()] == phrase_words[..]
    };

    if AFFIRMATIVE_REPLIES.iter().any(|p| opens_with(*p)) {
        Some(ReplyKind::Affirmative)
    } else if NEGATIVE_REPLIES.iter().any(|p| opens_with(*p)) {
        Some(ReplyKind::Negative)
    } else {
        None
    }
}

/// Holds at most one pending [`ConfirmationRequest`].
///
/// ```text
/// NONE --open--> Pending --confirm--> Confirmed
///                        --decline--> Declined
///                        --supersede--> Declined (superseded)
/// ```
#[derive(Debug, Default)]
pub struct ConfirmationTracker {
    pending: Option<ConfirmationRequest>,
}

impl ConfirmationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pending request, if any.
    pub fn pending(&self) -> Option<&ConfirmationRequest> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Opens a new request. Fails if one is already pending; supersede it
    /// first.
    pub fn open(&mut self, command: VoiceCommand, target: AgentId) -> Result<&ConfirmationRequest> {
        if self.pending.is_some() {
            return Err(RoutingError::ConfirmationPending);
        }
        let request = ConfirmationRequest::new(command, target);
        info!(confirmation = %request.id(), agent = %request.proposed_target(), "confirmation requested");
        Ok(&*self.pending.insert(request))
    }

    /// Marks the pending request confirmed and hands it back for dispatch.
    pub fn confirm(&mut self) -> Result<ConfirmationRequest> {
        self.resolve(ConfirmationResolution::Affirmed)
    }

    /// Marks the pending request declined.
    pub fn decline(&mut self) -> Result<ConfirmationRequest> {
        self.resolve(ConfirmationResolution::Denied)
    }

    /// Declines the pending request because a new command arrived.
    /// Returns `None` when nothing was pending.
    pub fn supersede(&mut self) -> Option<ConfirmationRequest> {
        self.resolve(ConfirmationResolution::Superseded).ok()
    }

    fn resolve(&mut self, resolution: ConfirmationResolution) -> Result<ConfirmationRequest> {
        let mut request = self.pending.take().ok_or(RoutingError::NoPendingConfirmation)?;
        request.resolve(resolution);
        info!(confirmation = %request.id(), resolution = %resolution, "confirmation resolved");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxroute_models::ConfirmationState;

    fn open(tracker: &mut ConfirmationTracker, transcript: &str) {
        tracker
            .open(VoiceCommand::typed(transcript), AgentId::new("alden"))
            .unwrap();
    }

    #[test]
    fn test_confirm_flow() {
        let mut tracker = ConfirmationTracker::new();
        open(&mut tracker, "delete my last session");
        assert!(tracker.pending().unwrap().is_pending());

        let request = tracker.confirm().unwrap();
        assert_eq!(request.state(), ConfirmationState::Confirmed);
        assert_eq!(request.original_command().transcript, "delete my last session");
        assert!(request.resolved_at().is_some());
        assert!(!tracker.has_pending());
    }

    #[test]
    fn test_decline_flow() {
        let mut tracker = ConfirmationTracker::new();
        open(&mut tracker, "send it");
        let request = tracker.decline().unwrap();
        assert_eq!(request.state(), ConfirmationState::Declined);
        assert_eq!(request.resolution(), Some(ConfirmationResolution::Denied));
    }

    #[test]
    fn test_single_flight() {
        let mut tracker = ConfirmationTracker::new();
        open(&mut tracker, "save this");
        let err = tracker
            .open(VoiceCommand::typed("delete that"), AgentId::new("alden"))
            .unwrap_err();
        assert!(matches!(err, RoutingError::ConfirmationPending));
    }

    #[test]
    fn test_supersede() {
        let mut tracker = ConfirmationTracker::new();
        assert!(tracker.supersede().is_none());

        open(&mut tracker, "wipe it");
        let request = tracker.supersede().unwrap();
        assert_eq!(request.state(), ConfirmationState::Declined);
        assert_eq!(request.resolution(), Some(ConfirmationResolution::Superseded));
        assert!(!tracker.has_pending());
    }

    #[test]
    fn test_answer_without_pending() {
        let mut tracker = ConfirmationTracker::new();
        assert!(matches!(tracker.confirm(), Err(RoutingError::NoPendingConfirmation)));
        assert!(matches!(tracker.decline(), Err(RoutingError::NoPendingConfirmation)));
    }

    #[test]
    fn test_classify_reply() {
        assert_eq!(classify_reply("Yes."), Some(ReplyKind::Affirmative));
        assert_eq!(classify_reply("go ahead please"), Some(ReplyKind::Affirmative));
        assert_eq!(classify_reply("No, never mind"), Some(ReplyKind::Negative));
        assert_eq!(classify_reply("don't"), Some(ReplyKind::Negative));
        assert_eq!(classify_reply("Never mind"), Some(ReplyKind::Negative));
    }

    #[test]
    fn test_classify_non_replies() {
        assert_eq!(classify_reply("yesterday's notes"), None);
        assert_eq!(classify_reply("nobody asked"), None);
        assert_eq!(classify_reply("yes and also rewrite this whole paragraph"), None);
        assert_eq!(classify_reply(""), None);
        assert_eq!(classify_reply("hey alden"), None);
    }
}
