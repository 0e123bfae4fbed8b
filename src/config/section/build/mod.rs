//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "src"               # Source tree (relative to site root)
//! output = "dist"              # Output tree (served)
//! work_dir = ".trellis"        # Compiled modules (never served)
//! public = "public"            # Mirrored verbatim into output
//! external_dir = "_external"   # Vendored packages: <output>/<external_dir>/<name>@<version>/
//! sidecar = "page.json"        # Per-route JSON sidecar name
//! api_manifest = "_api.json"   # API endpoint table
//! minify = false               # Minify vendored js/css
//! workers = 0                  # Route unit pool size (0 = available parallelism)
//! package_graph = "follow"     # follow | boundary
//! hydrate_script = "runtime/hydrate.js"
//! env_file = ".env"
//! ```

mod commands;
mod markdown;

pub use commands::{CompilerConfig, RuntimeConfig};
pub use markdown::MarkdownConfig;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the collector treats third-party packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageGraph {
    /// Walk into packages and collect their imports.
    #[default]
    Follow,
    /// Stop at the package boundary; the package is copied as one unit.
    Boundary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Compiler output. Server-only modules stay here; only browser-facing
    /// modules are published to `output`.
    pub work_dir: PathBuf,
    pub public: PathBuf,
    pub external_dir: String,
    pub sidecar: String,
    pub api_manifest: String,
    pub minify: bool,
    pub workers: usize,
    pub package_graph: PackageGraph,

    /// Browser bootstrap loaded by hydrated routes.
    pub hydrate_script: Option<PathBuf>,

    pub env_file: PathBuf,

    pub markdown: MarkdownConfig,
    pub runtime: RuntimeConfig,
    pub compiler: CompilerConfig,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            source: "src".into(),
            output: "dist".into(),
            work_dir: ".trellis".into(),
            public: "public".into(),
            external_dir: "_external".into(),
            sidecar: "page.json".into(),
            api_manifest: "_api.json".into(),
            minify: false,
            workers: 0,
            package_graph: PackageGraph::Follow,
            hydrate_script: None,
            env_file: ".env".into(),
            markdown: MarkdownConfig::default(),
            runtime: RuntimeConfig::default(),
            compiler: CompilerConfig::default(),
        }
    }
}

impl BuildSectionConfig {
    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}
