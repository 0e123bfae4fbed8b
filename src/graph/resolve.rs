//! Import specifier resolution.
//!
//! Node-compatible rules (exports maps, conditional exports) via
//! `oxc_resolver`, with the browser-facing conditions first so the collector
//! sees the same files the browser will load.

use std::path::{Component, Path, PathBuf};

use oxc_resolver::{ResolveError, ResolveOptions, Resolver};

/// Specifiers the pipeline never resolves: absolute URLs.
///
/// Runtime builtins (`fs`, `node:path`) are recognised by the resolver itself.
pub fn is_unresolvable(specifier: &str) -> bool {
    specifier.starts_with("http://")
        || specifier.starts_with("https://")
        || specifier.starts_with("data:")
}

/// Whether a resolved path lives in a package-manager controlled tree.
pub fn is_external_path(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == "node_modules"))
}

/// Bare specifier (`react`, `@scope/pkg/sub`) as opposed to a relative/absolute path.
pub fn is_bare(specifier: &str) -> bool {
    !(specifier.starts_with('.') || specifier.starts_with('/'))
}

pub struct ModuleResolver {
    inner: Resolver,
}

impl ModuleResolver {
    pub fn new() -> Self {
        let inner = Resolver::new(ResolveOptions {
            condition_names: vec![
                "browser".into(),
                "import".into(),
                "module".into(),
                "default".into(),
            ],
            extensions: vec![
                ".js".into(),
                ".mjs".into(),
                ".jsx".into(),
                ".ts".into(),
                ".mts".into(),
                ".tsx".into(),
                ".json".into(),
            ],
            main_fields: vec!["module".into(), "main".into()],
            builtin_modules: true,
            ..Default::default()
        });
        Self { inner }
    }

    /// Resolve `specifier` as imported from the file `importer`.
    ///
    /// `Ok(None)` for runtime builtins, which have no file to collect.
    pub fn resolve(&self, importer: &Path, specifier: &str) -> Result<Option<PathBuf>, String> {
        let dir = importer.parent().unwrap_or(importer);
        match self.inner.resolve(dir, specifier) {
            Ok(res) => Ok(Some(res.path().to_path_buf())),
            Err(ResolveError::Builtin { .. }) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}
