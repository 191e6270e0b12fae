//! Persistence for routing preferences.

use std::path::{Path, PathBuf};

use tracing::debug;
use voxroute_models::RoutingPreferences;

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::Result;

/// Stores routing preferences at `base_path/state/routing.json`.
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    /// Creates a store rooted at the voxroute state directory.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            path: base_path.as_ref().join("state").join("routing.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves preferences atomically.
    pub fn save(&self, prefs: &RoutingPreferences) -> Result<()> {
        debug!(path = %self.path.display(), mode = %prefs.mode, "saving routing preferences");
        atomic_write_json(&self.path, prefs)
    }

    /// Loads preferences, or defaults when none were saved.
    pub fn load(&self) -> Result<RoutingPreferences> {
        Ok(read_json_optional(&self.path)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use voxroute_models::{AgentId, RoutingMode};

    #[test]
    fn test_load_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let store = PreferencesStore::new(dir.path());

        let prefs = store.load().unwrap();
        assert_eq!(prefs, RoutingPreferences::default());
        assert_eq!(prefs.mode, RoutingMode::Agnostic);
    }

    #[test]
    fn test_save_and_restore() {
        let dir = tempdir().unwrap();
        let store = PreferencesStore::new(dir.path());

        let mut prefs = RoutingPreferences::default();
        prefs.pin(AgentId::new("sentry"));
        prefs.active_agent = Some(AgentId::new("alice"));
        prefs.external_enabled = true;
        store.save(&prefs).unwrap();

        assert!(store.path().ends_with("state/routing.json"));
        let restored = PreferencesStore::new(dir.path()).load().unwrap();
        assert_eq!(restored, prefs);
    }
}
