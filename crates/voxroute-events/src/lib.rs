//! Audit logging and breadcrumbs for the voice routing pipeline.
//!
//! This crate provides:
//! - [`AuditLogger`]: durable append with a bounded local buffer when the
//!   store is unreachable, pub/sub notifications, and filtered replay
//! - [`BreadcrumbTrail`]: a bounded, ordered trail of routing steps
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use voxroute_events::{AuditFilter, AuditLogger};
//! use voxroute_models::{AuditEvent, AuditEventType};
//! use voxroute_persistence::JsonlAuditStore;
//!
//! let logger = AuditLogger::new(Arc::new(JsonlAuditStore::new("/tmp/voxroute/audit")), 256);
//! let receiver = logger.subscribe();
//!
//! logger.record(AuditEvent::builder(AuditEventType::RoutingDecided).command("cmd-1").build());
//!
//! let filter = AuditFilter::new().with_event_type(AuditEventType::RoutingDecided);
//! let events = logger.replay(&filter).unwrap();
//! ```

pub mod breadcrumbs;
pub mod error;
pub mod filter;
pub mod logger;

pub use breadcrumbs::{BreadcrumbTrail, DEFAULT_BREADCRUMB_CAP};
pub use error::{EventError, Result};
pub use filter::AuditFilter;
pub use logger::{AuditLogger, RecordOutcome, DEFAULT_AUDIT_BUFFER};
