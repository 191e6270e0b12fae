//! Shared configuration paths.
//!
//! # Storage Structure
//!
//! All data is stored under `~/.voxroute/`:
//!
//! ```text
//! ~/.voxroute/
//! ├── audit/        # Append-only audit logs (JSON lines)
//! ├── config/       # User configuration (.env.local)
//! └── state/        # Routing preferences
//! ```
//!
//! # Environment Variables
//!
//! - `VOXROUTE_STATE_DIR`: Override the base state directory
//! - `VOXROUTE_AUDIT_DIR`: Override the audit log directory
//! - `VOXROUTE_CONFIG_DIR`: Override the config directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;

use crate::error::{ConfigError, Result};

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "VOXROUTE_STATE_DIR";

/// Environment variable for custom audit directory.
pub const AUDIT_DIR_ENV: &str = "VOXROUTE_AUDIT_DIR";

/// Environment variable for custom config directory.
pub const CONFIG_DIR_ENV: &str = "VOXROUTE_CONFIG_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".voxroute";

// Subdirectory names
const AUDIT_SUBDIR: &str = "audit";
const CONFIG_SUBDIR: &str = "config";
const STATE_SUBDIR: &str = "state";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the voxroute state directory.
///
/// The state directory is determined by:
/// 1. `VOXROUTE_STATE_DIR` environment variable if set
/// 2. `~/.voxroute` if home directory is available
/// 3. `.voxroute` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the audit log directory.
///
/// Defaults to `~/.voxroute/audit/` or `VOXROUTE_AUDIT_DIR` env var.
pub fn audit_dir() -> PathBuf {
    std::env::var(AUDIT_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(AUDIT_SUBDIR))
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(CONFIG_SUBDIR))
}

/// Get the runtime state directory.
pub fn runtime_state_dir() -> PathBuf {
    state_dir().join(STATE_SUBDIR)
}

/// Path of the persisted routing preferences under a state directory.
pub fn preferences_file(state_dir: &Path) -> PathBuf {
    state_dir.join(STATE_SUBDIR).join("routing.json")
}

/// Get the .env.local file path.
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Loads `.env.local` from the config directory, then from the working
/// directory. Missing files are ignored; already-set variables win.
pub fn load_env_files() {
    let env_path = env_file();
    if env_path.exists() {
        if let Err(e) = dotenvy::from_path(&env_path) {
            debug!(path = %env_path.display(), error = %e, "failed to load env file");
        }
    }
    let _ = dotenvy::from_filename(".env.local");
}

/// Ensure the state directory and all subdirectories exist.
pub fn ensure_all_dirs() -> Result<()> {
    for dir in [audit_dir(), config_dir(), runtime_state_dir()] {
        std::fs::create_dir_all(&dir)
            .map_err(|source| ConfigError::Directory { path: dir.clone(), source })?;
    }
    Ok(())
}
