//! Audit event types.
//!
//! Every routing decision, block, confirmation transition and dispatch
//! outcome produces one audit event. Events are append-only and ordered by
//! timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::ids::{AuditEventId, CommandId, SessionId};

/// Types of audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// The resolver chose a target.
    RoutingDecided,
    /// The safety gate refused the target.
    Blocked,
    /// A sensitive command is waiting for an answer.
    ConfirmationRequested,
    /// A pending confirmation was confirmed, declined or superseded.
    ConfirmationResolved,
    /// A backend answered.
    DispatchSucceeded,
    /// A backend attempt failed, or every backend did.
    DispatchFailed,
    /// The durable store was unreachable long enough to lose buffered events.
    AuditDegraded,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::RoutingDecided => "routing_decided",
            AuditEventType::Blocked => "blocked",
            AuditEventType::ConfirmationRequested => "confirmation_requested",
            AuditEventType::ConfirmationResolved => "confirmation_resolved",
            AuditEventType::DispatchSucceeded => "dispatch_succeeded",
            AuditEventType::DispatchFailed => "dispatch_failed",
            AuditEventType::AuditDegraded => "audit_degraded",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ALL_EVENT_TYPES
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown audit event type: {}", s))
    }
}

const ALL_EVENT_TYPES: &[AuditEventType] = &[
    AuditEventType::RoutingDecided,
    AuditEventType::Blocked,
    AuditEventType::ConfirmationRequested,
    AuditEventType::ConfirmationResolved,
    AuditEventType::DispatchSucceeded,
    AuditEventType::DispatchFailed,
    AuditEventType::AuditDegraded,
];

/// Event types that can close out a command.
///
/// Whether a particular event is terminal is carried by [`AuditEvent::terminal`]:
/// a failed attempt followed by a fallback success is not.
pub const TERMINAL_EVENT_TYPES: &[AuditEventType] = &[
    AuditEventType::Blocked,
    AuditEventType::ConfirmationResolved,
    AuditEventType::DispatchSucceeded,
    AuditEventType::DispatchFailed,
];

/// An entry in the append-only audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for the event.
    pub id: AuditEventId,

    /// Type of the event.
    pub event_type: AuditEventType,

    /// Command this event belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<CommandId>,

    /// Voice session the command arrived in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,

    /// True if this event records the final outcome of its command.
    #[serde(default)]
    pub terminal: bool,

    /// Event details.
    #[serde(default)]
    pub payload: HashMap<String, serde_json::Value>,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates a new event with an empty payload.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            id: AuditEventId::new(),
            event_type,
            command_id: None,
            session_id: None,
            terminal: false,
            payload: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Returns a payload field as a string, if present.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }

    /// Returns true if this event closes out its command.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_roundtrip_str() {
        for t in ALL_EVENT_TYPES {
            assert_eq!(t.as_str().parse::<AuditEventType>(), Ok(*t));
        }
        assert_eq!(
            "dispatch-failed".parse::<AuditEventType>(),
            Ok(AuditEventType::DispatchFailed)
        );
        assert!("nope".parse::<AuditEventType>().is_err());
    }

    #[test]
    fn test_event_serialization() {
        let mut event = AuditEvent::new(AuditEventType::Blocked);
        event.command_id = Some(CommandId::from_string("cmd-1"));
        event.terminal = true;
        event
            .payload
            .insert("agent".to_string(), serde_json::json!("gemini-cli"));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"blocked\""));
        assert!(!json.contains("session_id"));

        let back: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.field_str("agent"), Some("gemini-cli"));
    }

    #[test]
    fn test_terminal_defaults_to_false() {
        let json = r#"{"id":"aud-1","event_type":"routing_decided","timestamp":"2026-01-01T00:00:00Z"}"#;
        let event: AuditEvent = serde_json::from_str(json).unwrap();
        assert!(!event.is_terminal());
        assert!(event.payload.is_empty());
    }
}
