//! Voxroute Core - shared configuration for every voxroute crate.
//!
//! - **config**: state/audit/config directory layout and `.env.local` loading
//! - **settings**: router settings read from the environment

pub mod config;
pub mod error;
pub mod settings;

pub use config::{
    audit_dir, config_dir, ensure_all_dirs, env_file, load_env_files, preferences_file,
    runtime_state_dir, state_dir,
};
pub use error::{ConfigError, Result};
pub use settings::RouterSettings;
