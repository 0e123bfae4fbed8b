//! Environment layer: `.env` file overlaid by the process environment.
//!
//! Resolution chain per value (first hit wins):
//!
//! | Value          | Build variant (one-shot only)  | Plain          | `trellis.toml`        | Default              |
//! |----------------|--------------------------------|----------------|-----------------------|----------------------|
//! | host           | `TRELLIS_BUILD_HOST`           | `HOST`         | `server.host`         | `localhost`          |
//! | port           | `TRELLIS_BUILD_PORT`           | `PORT`         | `server.port`         | `3000`               |
//! | base URL       | `TRELLIS_BUILD_BASE_URL`       | `BASE_URL`     | `site.base_url`       | `http://host:port`   |
//! | API base URL   | `TRELLIS_BUILD_API_BASE_URL`   | `API_BASE_URL` | `site.api_base_url`   | `<base URL>/api`     |

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use rustc_hash::FxHashMap;

use super::ConfigError;
use super::util::normalize_base_url;
use crate::core::BuildMode;

/// Snapshot of environment variables visible to one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    vars: FxHashMap<String, String>,
}

impl EnvVars {
    /// Parse `.env` content. `export` prefixes, comments and quotes are handled.
    pub fn parse(content: &str) -> Self {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$").unwrap()
        });

        let mut vars = FxHashMap::default();
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some(caps) = re.captures(line) {
                vars.insert(caps[1].to_string(), unquote(&caps[2]));
            }
        }
        Self { vars }
    }

    /// Read the `.env` file (missing file = empty) and overlay the process environment.
    pub fn load(env_file: &Path) -> Result<Self, ConfigError> {
        let mut env = match std::fs::read_to_string(env_file) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(ConfigError::Io(env_file.to_path_buf(), e)),
        };
        env.vars.extend(std::env::vars());
        Ok(env)
    }

    #[cfg(test)]
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Look up `TRELLIS_BUILD_<key>` (one-shot builds) then `<key>`.
    fn lookup(&self, key: &str, mode: BuildMode) -> Option<(String, &str)> {
        if mode.build_env {
            let build_key = format!("TRELLIS_BUILD_{key}");
            if let Some(value) = self.get(&build_key) {
                return Some((build_key, value));
            }
        }
        self.get(key).map(|v| (key.to_string(), v))
    }
}

fn unquote(raw: &str) -> String {
    let value = raw.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    // Trailing comment on unquoted values
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}

/// Values derived from env + config, once per build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnv {
    pub host: String,
    pub port: u16,
    /// Absolute, no trailing slash.
    pub base_url: String,
    /// Absolute, no trailing slash.
    pub api_base_url: String,
}

impl ResolvedEnv {
    pub fn resolve(
        env: &EnvVars,
        mode: BuildMode,
        site: &super::SiteConfig,
    ) -> Result<Self, ConfigError> {
        let host = env
            .lookup("HOST", mode)
            .map(|(_, v)| v.to_string())
            .unwrap_or_else(|| site.server.host.clone());

        let port = match env.lookup("PORT", mode) {
            Some((var, value)) => {
                value
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort {
                        var,
                        value: value.to_string(),
                    })?
            }
            None => site.server.port,
        };

        let base_url = resolve_url(
            env.lookup("BASE_URL", mode),
            site.site.base_url.as_deref(),
            "site.base_url",
        )?
        .unwrap_or_else(|| format!("http://{host}:{port}"));

        let api_base_url = resolve_url(
            env.lookup("API_BASE_URL", mode),
            site.site.api_base_url.as_deref(),
            "site.api_base_url",
        )?
        .unwrap_or_else(|| format!("{base_url}/api"));

        Ok(Self {
            host,
            port,
            base_url,
            api_base_url,
        })
    }
}

fn resolve_url(
    from_env: Option<(String, &str)>,
    from_config: Option<&str>,
    config_key: &str,
) -> Result<Option<String>, ConfigError> {
    let (key, value) = match (from_env, from_config) {
        (Some((var, value)), _) => (var, value),
        (None, Some(value)) => (config_key.to_string(), value),
        (None, None) => return Ok(None),
    };
    normalize_base_url(value)
        .map(Some)
        .ok_or_else(|| ConfigError::InvalidUrl {
            key,
            value: value.to_string(),
        })
}
