//! Site configuration management for `trellis.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/    # [site] [build] [watch] [server]
//! ├── env         # .env + process env, resolution chain
//! ├── error       # ConfigError
//! ├── handle      # Live settings handle (arc-swap)
//! ├── settings    # Immutable per-build Settings value
//! └── mod.rs      # SiteConfig (this file)
//! ```

mod env;
mod error;
mod handle;
pub mod section;
mod settings;
mod util;

pub use env::{EnvVars, ResolvedEnv};
pub use error::ConfigError;
pub use handle::SettingsHandle;
pub use section::{
    BuildSectionConfig, CompilerConfig, MarkdownConfig, PackageGraph, RuntimeConfig,
    ServerConfig, SiteSectionConfig, WatchConfig,
};
pub use settings::Settings;
#[cfg(test)]
pub(crate) use settings::test_settings;

use crate::log;
use crate::utils::path::normalize_path;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

/// Default config file name.
pub const CONFIG_FILE: &str = "trellis.toml";

/// Root configuration structure representing trellis.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteSectionConfig,

    #[serde(default)]
    pub build: BuildSectionConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl SiteConfig {
    /// Locate (searching upward from cwd) and load the config file.
    pub fn load(config_name: &Path) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir()
            .map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;
        let path = find_config_file(config_name, &cwd)
            .ok_or_else(|| ConfigError::NotFound(config_name.to_path_buf()))?;
        Self::from_path(&path)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        let config_path = normalize_path(path);
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let mut config = config.with_root(&root);
        config.config_path = config_path;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Anchor all relative paths at `root`.
    pub fn with_root(mut self, root: &Path) -> Self {
        let root = normalize_path(root);
        let join = |p: &Path| normalize_path(&root.join(p));

        self.build.source = join(&self.build.source);
        self.build.output = join(&self.build.output);
        self.build.work_dir = join(&self.build.work_dir);
        self.build.public = join(&self.build.public);
        self.build.env_file = join(&self.build.env_file);
        self.build.compiler.config = join(&self.build.compiler.config);
        self.build.hydrate_script = self.build.hydrate_script.as_deref().map(join);
        self.root = root;
        self
    }

    /// Cross-field checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.output == self.root {
            return Err(ConfigError::Validation(
                "build.output must not be the project root".into(),
            ));
        }
        if self.build.source.starts_with(&self.build.output) {
            return Err(ConfigError::Validation(
                "build.source must not be inside build.output".into(),
            ));
        }
        let work = &self.build.work_dir;
        if *work == self.root
            || work.starts_with(&self.build.output)
            || self.build.output.starts_with(work)
            || self.build.source.starts_with(work)
            || work.starts_with(&self.build.source)
            || work.starts_with(&self.build.public)
        {
            return Err(ConfigError::Validation(format!(
                "build.work_dir `{}` must be its own directory, apart from source and output",
                self.root_relative(work).display()
            )));
        }
        if self.build.sidecar.contains('/') || self.build.sidecar.is_empty() {
            return Err(ConfigError::Validation(format!(
                "build.sidecar must be a plain file name, got `{}`",
                self.build.sidecar
            )));
        }
        if self.build.external_dir.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "build.external_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Get path relative to the site root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        let result: Result<SiteConfig, _> = toml::from_str("[build\nsource = \"src\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[build]\nsource = \"app\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.build.source, PathBuf::from("app"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_with_root_anchors_paths() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("[build]\nhydrate_script = \"runtime/hydrate.js\"")
            .with_root(dir.path());
        let root = normalize_path(dir.path());

        assert_eq!(config.root, root);
        assert_eq!(config.build.source, root.join("src"));
        assert_eq!(config.build.output, root.join("dist"));
        assert_eq!(config.build.work_dir, root.join(".trellis"));
        assert_eq!(config.build.env_file, root.join(".env"));
        assert_eq!(
            config.build.hydrate_script,
            Some(root.join("runtime/hydrate.js"))
        );
        assert_eq!(config.root_relative(root.join("src/a.js")), PathBuf::from("src/a.js"));
    }

    #[test]
    fn test_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[server]\nport = 4321\n").unwrap();

        let config = SiteConfig::from_path(&path).unwrap();
        assert_eq!(config.server.port, 4321);
        assert_eq!(config.root, normalize_path(dir.path()));
        assert_eq!(config.config_path, normalize_path(&path));
    }

    #[test]
    fn test_validate_rejects_source_inside_output() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("[build]\nsource = \"dist/src\"").with_root(dir.path());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_keeps_work_dir_out_of_output() {
        let dir = TempDir::new().unwrap();
        let inside = test_parse_config("[build]\nwork_dir = \"dist/.work\"").with_root(dir.path());
        assert!(matches!(inside.validate(), Err(ConfigError::Validation(m)) if m.contains("work_dir")));

        let fine = test_parse_config("[build]\nwork_dir = \"target/trellis\"").with_root(dir.path());
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nested_sidecar() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("[build]\nsidecar = \"a/b.json\"").with_root(dir.path());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
