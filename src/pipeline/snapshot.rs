//! Immutable view of one collection pass.
//!
//! A snapshot is built from scratch and never patched: a structural change
//! (rename, new route, new import) produces a new `Snapshot` that replaces
//! the old one wholesale. Route units receive it behind an `Arc`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::BuildError;
use crate::asset::{Externalized, PackageCache, externalize};
use crate::compiler::is_compilable;
use crate::config::Settings;
use crate::core::{FileRole, Route, is_script};
use crate::graph::{BoundaryViolation, ModuleGraph, ModuleResolver, check_boundaries, collect};
use crate::route::{RouteTable, SourceFile, map_routes};
use crate::utils::walk::collect_all_files;

pub struct Snapshot {
    pub settings: Arc<Settings>,
    /// Compiled modules (relative to the compiled root in the work
    /// directory) and markdown
    /// (relative to the source root).
    pub files: Vec<SourceFile>,
    pub graph: ModuleGraph,
    pub routes: RouteTable,
    pub externalized: Externalized,
    pub packages: Arc<PackageCache>,
    pub hydrate_script: Option<PathBuf>,
    /// Browser URL of the hydrate script once copied.
    pub hydrate_url: Option<String>,
    pub violations: Vec<BoundaryViolation>,
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("files", &self.files.len())
            .field("routes", &self.routes.len())
            .field("violations", &self.violations.len())
            .finish_non_exhaustive()
    }
}

impl Snapshot {
    /// Collect, map and externalize the current compiled tree.
    pub fn collect(settings: Arc<Settings>, packages: Arc<PackageCache>) -> Result<Self, BuildError> {
        let files = list_sources(&settings);
        let hydrate_script = settings.config.build.hydrate_script.clone();

        let mut entries: Vec<PathBuf> = files
            .iter()
            .filter(|f| f.role != FileRole::Module && is_script(&f.path))
            .map(|f| f.path.clone())
            .collect();
        entries.extend(hydrate_script.iter().cloned());

        let resolver = ModuleResolver::new();
        let graph = collect(&entries, &resolver, settings.config.build.package_graph)?;
        let routes = map_routes(&files, &graph);
        let violations = check_boundaries(&graph);

        let extra: Vec<PathBuf> = hydrate_script.iter().cloned().collect();
        let mut externalized = externalize(&graph, &extra, &settings, &packages)?;

        // only what the browser loads leaves the work directory
        let mut browser: Vec<&Path> = routes.entries().flat_map(|e| e.browser_entries()).collect();
        browser.extend(hydrate_script.as_deref());
        let closure = graph.closure(browser);
        externalized.publish(closure.iter().map(PathBuf::as_path));

        let hydrate_url = hydrate_script
            .as_deref()
            .and_then(|script| settings.output_url(&externalized.output_of(script)));

        Ok(Self {
            settings,
            files,
            graph,
            routes,
            externalized,
            packages,
            hydrate_script,
            hydrate_url,
            violations,
        })
    }

    /// Routes whose content file, layouts or any module they import is in
    /// `changed`.
    pub fn affected_routes(&self, changed: &[PathBuf]) -> BTreeSet<Route> {
        let changed: FxHashSet<&Path> = changed.iter().map(PathBuf::as_path).collect();
        self.routes
            .entries()
            .filter(|entry| {
                entry.files().any(|f| changed.contains(f))
                    || self
                        .graph
                        .closure(entry.files())
                        .iter()
                        .any(|f| changed.contains(f.as_path()))
            })
            .map(|entry| entry.route.clone())
            .collect()
    }

    /// Every route in the table.
    pub fn all_routes(&self) -> Vec<Route> {
        self.routes.routes().cloned().collect()
    }
}

/// Compiled modules plus markdown straight from the source tree.
fn list_sources(settings: &Settings) -> Vec<SourceFile> {
    let compiled_root = settings.compiled_root();
    let source_root = settings.source_root();

    let compiled = collect_all_files(&compiled_root)
        .into_iter()
        .filter(|p| is_compilable(p))
        .filter_map(|p| {
            let rel = p.strip_prefix(&compiled_root).ok()?.to_path_buf();
            SourceFile::new(p, rel)
        });
    let markdown = collect_all_files(source_root)
        .into_iter()
        .filter(|p| FileRole::from_path(p) == Some(FileRole::Markdown))
        .filter_map(|p| {
            let rel = p.strip_prefix(source_root).ok()?.to_path_buf();
            SourceFile::new(p, rel)
        });

    let mut files: Vec<SourceFile> = compiled.chain(markdown).collect();
    files.sort_by(|a, b| a.rel.cmp(&b.rel));
    files
}
