//! Builder for audit events.

use chrono::Utc;
use std::collections::HashMap;

use crate::audit::{AuditEvent, AuditEventType};
use crate::ids::{AuditEventId, CommandId, SessionId};

/// Builder for creating AuditEvent instances with a fluent API.
#[derive(Debug, Clone)]
pub struct AuditEventBuilder {
    event_type: AuditEventType,
    command_id: Option<CommandId>,
    session_id: Option<SessionId>,
    terminal: bool,
    payload: HashMap<String, serde_json::Value>,
}

impl AuditEventBuilder {
    /// Creates a new builder for the given event type.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_type,
            command_id: None,
            session_id: None,
            terminal: false,
            payload: HashMap::new(),
        }
    }

    /// Associates the event with a command.
    pub fn command(mut self, command_id: impl Into<CommandId>) -> Self {
        self.command_id = Some(command_id.into());
        self
    }

    /// Associates the event with a voice session.
    pub fn session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Marks the event as the command's final outcome.
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// Adds a payload field.
    pub fn with_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Adds a payload field only when the value is present.
    pub fn with_optional_field<V: Into<serde_json::Value>>(
        self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(v) => self.with_field(key, v),
            None => self,
        }
    }

    /// Builds the AuditEvent.
    pub fn build(self) -> AuditEvent {
        AuditEvent {
            id: AuditEventId::new(),
            event_type: self.event_type,
            command_id: self.command_id,
            session_id: self.session_id,
            terminal: self.terminal,
            payload: self.payload,
            timestamp: Utc::now(),
        }
    }
}

/// Convenience constructors on AuditEvent.
impl AuditEvent {
    /// Creates a builder for a new event.
    pub fn builder(event_type: AuditEventType) -> AuditEventBuilder {
        AuditEventBuilder::new(event_type)
    }

    /// Creates the meta-event recorded when buffered events had to be dropped.
    pub fn degraded(dropped: usize, capacity: usize) -> Self {
        AuditEventBuilder::new(AuditEventType::AuditDegraded)
            .with_field("reason", "audit store unavailable, local buffer overflowed")
            .with_field("dropped", dropped)
            .with_field("buffer_capacity", capacity)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let event = AuditEvent::builder(AuditEventType::RoutingDecided).build();

        assert!(event.id.as_str().starts_with("aud-"));
        assert_eq!(event.event_type, AuditEventType::RoutingDecided);
        assert!(!event.terminal);
        assert!(event.command_id.is_none());
    }

    #[test]
    fn test_builder_with_fields() {
        let event = AuditEvent::builder(AuditEventType::DispatchSucceeded)
            .command("cmd-1")
            .session("voice-1")
            .terminal()
            .with_field("agent", "alden")
            .with_field("attempts", 2)
            .with_optional_field::<&str>("missing", None)
            .build();

        assert_eq!(event.command_id.as_ref().map(|c| c.as_str()), Some("cmd-1"));
        assert_eq!(event.session_id.as_ref().map(|s| s.as_str()), Some("voice-1"));
        assert!(event.terminal);
        assert_eq!(event.payload.get("agent"), Some(&serde_json::json!("alden")));
        assert_eq!(event.payload.get("attempts"), Some(&serde_json::json!(2)));
        assert!(!event.payload.contains_key("missing"));
    }

    #[test]
    fn test_degraded_helper() {
        let event = AuditEvent::degraded(1, 256);
        assert_eq!(event.event_type, AuditEventType::AuditDegraded);
        assert_eq!(event.payload.get("dropped"), Some(&serde_json::json!(1)));
    }
}
