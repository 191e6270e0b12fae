//! Voice command routing.
//!
//! Decides which agent receives a transcript and whether it may be
//! dispatched:
//!
//! - [`normalize`] cleans the transcript and extracts wake-word candidates
//! - [`AgentResolver`] picks the target under the current [`RoutingContext`]
//! - [`DeferenceAdvisor`] suggests a better-suited agent, without binding
//! - [`SafetyGate`] blocks disabled external agents and flags sensitive commands
//! - [`ConfirmationTracker`] holds the single pending confirmation

pub mod confirmation;
pub mod deference;
pub mod error;
pub mod gate;
pub mod normalizer;
pub mod patterns;
pub mod registry;
pub mod resolver;

pub use confirmation::{classify_reply, ConfirmationTracker, ReplyKind};
pub use deference::DeferenceAdvisor;
pub use error::{Result, RoutingError};
pub use gate::{
    external_block_message, ConfirmationPolicy, GateVerdict, KeywordConfirmationPolicy,
    NeverConfirm, SafetyGate,
};
pub use normalizer::{normalize, NormalizedTranscript, UNIVERSAL_COMMANDS};
pub use patterns::KeywordPattern;
pub use registry::{
    AgentRegistry, StaticAgentRegistry, DEFAULT_EXTERNAL_AGENTS, DEFAULT_LOCAL_AGENTS,
};
pub use resolver::{AgentResolver, RoutingContext};
