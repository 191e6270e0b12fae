//! Breadcrumb entries for the observable routing trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::AgentId;

/// A step a command passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreadcrumbStep {
    Received,
    Resolved,
    DeferenceSuggested,
    Blocked,
    ConfirmationRequested,
    Confirmed,
    Declined,
    Superseded,
    Dispatched,
    DispatchFailed,
}

impl BreadcrumbStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreadcrumbStep::Received => "received",
            BreadcrumbStep::Resolved => "resolved",
            BreadcrumbStep::DeferenceSuggested => "deference_suggested",
            BreadcrumbStep::Blocked => "blocked",
            BreadcrumbStep::ConfirmationRequested => "confirmation_requested",
            BreadcrumbStep::Confirmed => "confirmed",
            BreadcrumbStep::Declined => "declined",
            BreadcrumbStep::Superseded => "superseded",
            BreadcrumbStep::Dispatched => "dispatched",
            BreadcrumbStep::DispatchFailed => "dispatch_failed",
        }
    }
}

impl fmt::Display for BreadcrumbStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step in the trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreadcrumbEntry {
    pub step: BreadcrumbStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentId>,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl BreadcrumbEntry {
    /// Creates an entry stamped now.
    pub fn new(step: BreadcrumbStep, agent: Option<AgentId>, confidence: f32) -> Self {
        Self {
            step,
            agent,
            confidence,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for BreadcrumbEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.agent {
            Some(agent) => write!(f, "{}({})", self.step, agent),
            None => write!(f, "{}", self.step),
        }
    }
}
