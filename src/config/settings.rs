//! Immutable per-build settings.
//!
//! `Settings` is derived once per build from `SiteConfig` + environment and
//! threaded through every phase. Nothing reads ambient process state after
//! this point.

use std::path::{Path, PathBuf};

use super::{ConfigError, EnvVars, ResolvedEnv, SiteConfig};
use crate::core::{BuildMode, Route};
use crate::utils::path::to_slash;

#[derive(Debug, Clone)]
pub struct Settings {
    pub config: SiteConfig,
    pub mode: BuildMode,
    pub env: ResolvedEnv,
}

impl Settings {
    /// Derive settings from the `.env` file and the process environment.
    pub fn resolve(config: SiteConfig, mode: BuildMode) -> Result<Self, ConfigError> {
        let env = EnvVars::load(&config.build.env_file)?;
        Self::with_env(config, mode, &env)
    }

    /// Derive settings from an explicit environment snapshot.
    pub fn with_env(config: SiteConfig, mode: BuildMode, env: &EnvVars) -> Result<Self, ConfigError> {
        let env = ResolvedEnv::resolve(env, mode, &config)?;
        Ok(Self { config, mode, env })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    #[inline]
    pub fn source_root(&self) -> &Path {
        &self.config.build.source
    }

    #[inline]
    pub fn output_root(&self) -> &Path {
        &self.config.build.output
    }

    #[inline]
    pub fn public_root(&self) -> &Path {
        &self.config.build.public
    }

    #[inline]
    pub fn work_root(&self) -> &Path {
        &self.config.build.work_dir
    }

    /// Source directory relative to the project root (`src`).
    fn source_rel(&self) -> PathBuf {
        let source = self.source_root();
        source
            .strip_prefix(self.root())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| source.file_name().map(PathBuf::from).unwrap_or_default())
    }

    /// Where compiled modules land: `<work_dir>/<source dir relative to root>`.
    ///
    /// Keeping the source layout below the compiled root means compiled
    /// modules import each other with the same relative specifiers as the
    /// sources.
    pub fn compiled_root(&self) -> PathBuf {
        self.work_root().join(self.source_rel())
    }

    /// Where browser-facing compiled modules are published:
    /// `<output>/<source dir relative to root>`.
    pub fn published_root(&self) -> PathBuf {
        self.output_root().join(self.source_rel())
    }

    /// `<output>/<external_dir>`
    pub fn external_root(&self) -> PathBuf {
        self.output_root()
            .join(self.config.build.external_dir.trim_matches('/'))
    }

    /// Browser URL of a file inside the output root (`/src/about/index.client.js`).
    pub fn output_url(&self, path: &Path) -> Option<String> {
        path.strip_prefix(self.output_root())
            .ok()
            .map(|rel| format!("/{}", to_slash(rel)))
    }

    /// Absolute URL of a route.
    pub fn absolute_url(&self, route: &Route) -> String {
        format!("{}{}", self.env.base_url, route.to_encoded())
    }

    /// Absolute URL of an API endpoint path (`/about/getAboutData`).
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.env.api_base_url, path)
    }

    /// `<output>/<route>/index.html`
    pub fn html_path(&self, route: &Route) -> PathBuf {
        self.route_dir(route).join("index.html")
    }

    /// `<output>/<route>/<sidecar>`
    pub fn sidecar_path(&self, route: &Route) -> PathBuf {
        self.route_dir(route).join(&self.config.build.sidecar)
    }

    fn route_dir(&self, route: &Route) -> PathBuf {
        let mut dir = self.output_root().to_path_buf();
        for segment in route.segments() {
            dir.push(segment);
        }
        dir
    }
}

#[cfg(test)]
pub(crate) fn test_settings(root: &Path, extra: &str) -> Settings {
    let config = crate::config::test_parse_config(extra).with_root(root);
    Settings::with_env(config, BuildMode::ONE_SHOT, &EnvVars::default()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let dir = TempDir::new().unwrap();
        let settings = test_settings(dir.path(), "");
        let out = settings.output_root().to_path_buf();

        assert_eq!(settings.compiled_root(), settings.root().join(".trellis/src"));
        assert_eq!(settings.published_root(), out.join("src"));
        assert_eq!(settings.external_root(), out.join("_external"));
        assert_eq!(settings.html_path(&Route::root()), out.join("index.html"));
        assert_eq!(
            settings.sidecar_path(&Route::new("/about")),
            out.join("about/page.json")
        );
        assert_eq!(
            settings.output_url(&out.join("src/about/index.client.js")).as_deref(),
            Some("/src/about/index.client.js")
        );
    }

    #[test]
    fn test_urls() {
        let dir = TempDir::new().unwrap();
        let settings = test_settings(dir.path(), "[site]\nbase_url = \"https://example.com\"");
        assert_eq!(
            settings.absolute_url(&Route::new("/about")),
            "https://example.com/about/"
        );
        assert_eq!(
            settings.api_url("/about/getAboutData"),
            "https://example.com/api/about/getAboutData"
        );
    }
}
