//! Live settings with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and wholesale replacement. Readers
//! take an `Arc<Settings>` snapshot at the start of a build and keep it for
//! the whole build, so a reload never changes values mid-build.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use arc_swap::ArcSwap;

use super::{Settings, SiteConfig};
use crate::utils::hash;

pub struct SettingsHandle {
    current: ArcSwap<Settings>,
    /// Hash of config file + env file content that produced `current`.
    source_hash: AtomicU64,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        let source_hash = Self::hash_sources(&settings);
        Self {
            current: ArcSwap::from_pointee(settings),
            source_hash: AtomicU64::new(source_hash),
        }
    }

    #[inline]
    pub fn load(&self) -> Arc<Settings> {
        self.current.load_full()
    }

    /// Re-read `trellis.toml` and the environment.
    ///
    /// Returns `Ok(true)` when the inputs changed and new settings were stored.
    pub fn reload(&self) -> Result<bool> {
        let old = self.load();
        let new_hash = Self::hash_sources(&old);
        if new_hash == self.source_hash.load(Ordering::Relaxed) {
            return Ok(false);
        }

        let config = SiteConfig::from_path(&old.config.config_path)
            .with_context(|| format!("reloading {}", old.config.config_path.display()))?;
        let settings = Settings::resolve(config, old.mode)?;

        self.current.store(Arc::new(settings));
        self.source_hash.store(new_hash, Ordering::Relaxed);
        Ok(true)
    }

    fn hash_sources(settings: &Settings) -> u64 {
        let config = hash::file(&settings.config.config_path);
        let env = hash::file(&settings.config.build.env_file);
        config.rotate_left(1) ^ env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CONFIG_FILE, EnvVars};
    use crate::core::BuildMode;
    use std::fs;
    use tempfile::TempDir;

    fn handle_for(dir: &TempDir, toml: &str) -> SettingsHandle {
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, toml).unwrap();
        let config = SiteConfig::from_path(&path).unwrap();
        SettingsHandle::new(Settings::with_env(config, BuildMode::WATCH, &EnvVars::default()).unwrap())
    }

    #[test]
    fn test_reload_unchanged() {
        let dir = TempDir::new().unwrap();
        let handle = handle_for(&dir, "[server]\nport = 4000\n");
        assert!(!handle.reload().unwrap());
    }

    #[test]
    fn test_reload_swaps_settings() {
        let dir = TempDir::new().unwrap();
        let handle = handle_for(&dir, "[site]\nbase_url = \"https://old.example\"\n");
        let before = handle.load();

        fs::write(
            dir.path().join(CONFIG_FILE),
            "[site]\nbase_url = \"https://new.example\"\n",
        )
        .unwrap();
        assert!(handle.reload().unwrap());

        // Snapshot taken earlier is untouched
        assert_eq!(before.env.base_url, "https://old.example");
        assert_eq!(handle.load().env.base_url, "https://new.example");
    }

    #[test]
    fn test_reload_error_keeps_old_settings() {
        let dir = TempDir::new().unwrap();
        let handle = handle_for(&dir, "[server]\nport = 4000\n");
        fs::write(dir.path().join(CONFIG_FILE), "[server\n").unwrap();

        assert!(handle.reload().is_err());
        assert_eq!(handle.load().config.server.port, 4000);
    }
}
