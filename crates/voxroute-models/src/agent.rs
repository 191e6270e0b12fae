//! Agent identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a persona/agent that can receive voice commands.
///
/// Agent ids are drawn from a closed registry and compared case-insensitively,
/// so construction normalizes to trimmed lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct AgentId(String);

impl AgentId {
    /// Creates an agent id, normalizing case and surrounding whitespace.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    /// Returns the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the id with its first letter capitalized ("alden" -> "Alden").
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether an agent runs locally or is an external integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Always available.
    Local,
    /// Available only while external agents are enabled.
    External,
}

impl AgentKind {
    /// Returns true for external agents.
    pub fn is_external(&self) -> bool {
        matches!(self, AgentKind::External)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Local => write!(f, "local"),
            AgentKind::External => write!(f, "external"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_normalizes() {
        assert_eq!(AgentId::new("  Alden "), AgentId::from("alden"));
    }

    #[test]
    fn test_agent_id_deserialize_normalizes() {
        let id: AgentId = serde_json::from_str("\"Gemini-CLI\"").unwrap();
        assert_eq!(id.as_str(), "gemini-cli");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"gemini-cli\"");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(AgentId::new("alden").display_name(), "Alden");
        assert_eq!(AgentId::new("gemini-cli").display_name(), "Gemini-cli");
        assert_eq!(AgentId::new("").display_name(), "");
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&AgentKind::External).unwrap();
        assert_eq!(json, "\"external\"");
        assert!(AgentKind::External.is_external());
        assert!(!AgentKind::Local.is_external());
    }
}
