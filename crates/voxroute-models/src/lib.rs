//! Core data models for voice command routing.
//!
//! This crate provides the fundamental data types shared by every stage of
//! the routing pipeline: commands, agents, routing decisions, confirmation
//! requests, audit events, breadcrumbs and dispatch results.

pub mod agent;
pub mod audit;
pub mod breadcrumb;
pub mod builders;
pub mod command;
pub mod confirmation;
pub mod dispatch;
pub mod ids;
pub mod routing;

// Re-export main types
pub use agent::{AgentId, AgentKind};
pub use audit::{AuditEvent, AuditEventType, TERMINAL_EVENT_TYPES};
pub use breadcrumb::{BreadcrumbEntry, BreadcrumbStep};
pub use builders::AuditEventBuilder;
pub use command::{VoiceCommand, DEFAULT_CONFIDENCE};
pub use confirmation::{ConfirmationRequest, ConfirmationResolution, ConfirmationState};
pub use dispatch::{AttemptOutcome, AttemptRecord, BackendRequest, BackendResponse, DispatchResult};
pub use ids::{AuditEventId, CommandId, ConfirmationId, SessionId};
pub use routing::{
    DeferenceSuggestion, RoutingBasis, RoutingDecision, RoutingMode, RoutingPreferences,
};
