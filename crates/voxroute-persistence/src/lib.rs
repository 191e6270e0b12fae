//! Persistence layer for voxroute.
//!
//! Audit events are appended to a JSON lines log; routing preferences are
//! written atomically (write to temp file, then rename).
//!
//! # Example
//!
//! ```no_run
//! use voxroute_persistence::{AuditStore, JsonlAuditStore, PreferencesStore};
//! use voxroute_models::{AuditEvent, AuditEventType, RoutingPreferences};
//!
//! let audit = JsonlAuditStore::new("/home/user/.voxroute/audit");
//! audit.append(&AuditEvent::new(AuditEventType::RoutingDecided)).unwrap();
//!
//! let prefs = PreferencesStore::new("/home/user/.voxroute");
//! prefs.save(&RoutingPreferences::default()).unwrap();
//! ```

pub mod atomic;
pub mod audit_store;
pub mod error;
pub mod preferences_store;

pub use audit_store::{AuditStore, JsonlAuditStore, MemoryAuditStore};
pub use error::{PersistenceError, Result};
pub use preferences_store::PreferencesStore;
