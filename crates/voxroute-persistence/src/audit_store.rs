//! Durable audit event storage.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::warn;
use voxroute_models::AuditEvent;

use crate::atomic::ensure_dir;
use crate::error::{PersistenceError, Result};

/// Default log file name inside the audit directory.
pub const AUDIT_LOG_FILE: &str = "audit.jsonl";

/// Append-only store for audit events.
pub trait AuditStore: Send + Sync {
    /// Durably appends one event.
    fn append(&self, event: &AuditEvent) -> Result<()>;

    /// Loads every stored event in append order.
    fn load(&self) -> Result<Vec<AuditEvent>>;
}

/// Audit store backed by a JSON lines file.
///
/// ```text
/// audit_dir/
/// └── audit.jsonl    # one AuditEvent per line
/// ```
pub struct JsonlAuditStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAuditStore {
    /// Creates a store writing `audit.jsonl` inside `audit_dir`.
    pub fn new(audit_dir: impl AsRef<Path>) -> Self {
        Self::at_path(audit_dir.as_ref().join(AUDIT_LOG_FILE))
    }

    /// Creates a store writing to an explicit file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditStore for JsonlAuditStore {
    fn append(&self, event: &AuditEvent) -> Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PersistenceError::Unavailable("audit log lock poisoned".into()))?;

        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }

        let write_err = |source: std::io::Error| PersistenceError::WriteError {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        file.write_all(line.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<AuditEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path).map_err(|source| PersistenceError::ReadError {
            path: self.path.clone(),
            source,
        })?;

        let mut events = Vec::new();
        for (lineno, line) in data.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    // A torn final line after a crash is the usual cause
                    warn!(path = %self.path.display(), line = lineno + 1, error = %e, "skipping unreadable audit line");
                }
            }
        }
        Ok(events)
    }
}

/// In-memory audit store.
///
/// Can be switched unavailable to simulate an unreachable durable store.
#[derive(Default)]
pub struct MemoryAuditStore {
    events: Mutex<Vec<AuditEvent>>,
    unavailable: AtomicBool,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent appends succeed (`true`) or fail (`false`).
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, event: &AuditEvent) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("memory store offline".into()));
        }
        self.events
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store lock poisoned".into()))?
            .push(event.clone());
        Ok(())
    }

    fn load(&self) -> Result<Vec<AuditEvent>> {
        self.events
            .lock()
            .map(|e| e.clone())
            .map_err(|_| PersistenceError::Unavailable("memory store lock poisoned".into()))
    }
}
