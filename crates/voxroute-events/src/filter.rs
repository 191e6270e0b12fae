//! Audit event filtering for replay.

use chrono::{DateTime, Utc};
use voxroute_models::{AuditEvent, AuditEventType, CommandId};

/// Filter criteria for replaying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Filter by event type.
    pub event_type: Option<AuditEventType>,
    /// Filter by command ID.
    pub command_id: Option<CommandId>,
    /// Only events at or after this time.
    pub since: Option<DateTime<Utc>>,
    /// Only events at or before this time.
    pub until: Option<DateTime<Utc>>,
    /// Only terminal events.
    pub terminal_only: bool,
}

impl AuditFilter {
    /// Creates a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_type(mut self, event_type: AuditEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_command_id(mut self, command_id: impl Into<CommandId>) -> Self {
        self.command_id = Some(command_id.into());
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn terminal_only(mut self) -> Self {
        self.terminal_only = true;
        self
    }

    /// Returns true if the event matches this filter.
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }

        if let Some(ref command_id) = self.command_id {
            if event.command_id.as_ref() != Some(command_id) {
                return false;
            }
        }

        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }

        if let Some(until) = self.until {
            if event.timestamp > until {
                return false;
            }
        }

        !self.terminal_only || event.is_terminal()
    }
}
