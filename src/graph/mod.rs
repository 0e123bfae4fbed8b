//! Dependency graph collector.
//!
//! Crawls entry modules, resolves every static import, and classifies each
//! dependency as local source or external package.
//!
//! ```text
//! entries ──► scan (oxc) ──► resolve (oxc_resolver) ──► classify ──► frontier
//!                 ▲                                                    │
//!                 └────────────────────────────────────────────────────┘
//! ```
//!
//! The result is immutable: re-collection builds a new `ModuleGraph`.

mod boundary;
mod parse;
mod resolve;

pub use boundary::{BoundaryViolation, check_boundaries};
use parse::scan_module;
pub use resolve::{ModuleResolver, is_bare, is_external_path, is_unresolvable};

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use thiserror::Error;

use crate::config::PackageGraph;
use crate::core::{FileRole, is_script};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Local,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDependency {
    pub specifier: String,
    pub resolved: PathBuf,
    pub kind: DependencyKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleRecord {
    pub source: PathBuf,
    pub role: Option<FileRole>,
    pub dependencies: Vec<ModuleDependency>,
    pub exports: Vec<String>,
    pub has_default: bool,
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse `{path}`: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("cannot resolve `{specifier}` imported from `{importer}`: {reason}")]
    Unresolved {
        specifier: String,
        importer: PathBuf,
        reason: String,
    },
}

/// Collected modules plus the deduplicated dependency list.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<ModuleRecord>,
    index: FxHashMap<PathBuf, usize>,
    dependencies: Vec<ModuleDependency>,
}

impl ModuleGraph {
    /// All scanned modules, sorted by path.
    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    /// Every dependency across all modules, unique by resolved path.
    pub fn dependencies(&self) -> &[ModuleDependency] {
        &self.dependencies
    }

    pub fn module(&self, path: &Path) -> Option<&ModuleRecord> {
        self.index.get(path).map(|&i| &self.modules[i])
    }

    /// Files reachable from `entries` (entries included), sorted.
    ///
    /// Non-module dependencies (json, css, boundary packages) are included as
    /// leaves.
    pub fn closure<'a>(&self, entries: impl IntoIterator<Item = &'a Path>) -> Vec<PathBuf> {
        let mut seen: FxHashSet<&Path> = FxHashSet::default();
        let mut queue: VecDeque<&Path> = VecDeque::new();
        for entry in entries {
            if seen.insert(entry) {
                queue.push_back(entry);
            }
        }
        while let Some(path) = queue.pop_front() {
            if let Some(record) = self.module(path) {
                for dep in &record.dependencies {
                    if seen.insert(dep.resolved.as_path()) {
                        queue.push_back(dep.resolved.as_path());
                    }
                }
            }
        }
        let mut out: Vec<PathBuf> = seen.into_iter().map(Path::to_path_buf).collect();
        out.sort();
        out
    }

    /// External dependencies only.
    #[cfg(test)]
    pub fn external(&self) -> impl Iterator<Item = &ModuleDependency> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == DependencyKind::External)
    }
}

/// Crawl `entries` and every module they statically import.
pub fn collect(
    entries: &[PathBuf],
    resolver: &ModuleResolver,
    packages: PackageGraph,
) -> Result<ModuleGraph, CollectError> {
    let mut visited: FxHashSet<PathBuf> = entries.iter().cloned().collect();
    let mut frontier: Vec<PathBuf> = visited.iter().cloned().collect();
    let mut modules = Vec::new();

    while !frontier.is_empty() {
        let scanned: Vec<ModuleRecord> = frontier
            .par_iter()
            .map(|path| scan_record(path, resolver))
            .collect::<Result<_, _>>()?;

        let mut next = Vec::new();
        for record in &scanned {
            for dep in &record.dependencies {
                if !should_descend(dep, packages) {
                    continue;
                }
                if visited.insert(dep.resolved.clone()) {
                    next.push(dep.resolved.clone());
                }
            }
        }
        modules.extend(scanned);
        frontier = next;
    }

    Ok(build_graph(modules))
}

fn should_descend(dep: &ModuleDependency, packages: PackageGraph) -> bool {
    if !is_script(&dep.resolved) {
        return false;
    }
    match dep.kind {
        DependencyKind::Local => true,
        DependencyKind::External => packages == PackageGraph::Follow,
    }
}

fn scan_record(path: &Path, resolver: &ModuleResolver) -> Result<ModuleRecord, CollectError> {
    let source = std::fs::read_to_string(path).map_err(|source| CollectError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let scan = scan_module(path, &source).map_err(|message| CollectError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    let mut seen = FxHashSet::default();
    let mut dependencies = Vec::with_capacity(scan.imports.len());
    for specifier in scan.imports {
        if is_unresolvable(&specifier) {
            continue;
        }
        let resolved =
            resolver
                .resolve(path, &specifier)
                .map_err(|reason| CollectError::Unresolved {
                    specifier: specifier.clone(),
                    importer: path.to_path_buf(),
                    reason,
                })?;
        // runtime builtin
        let Some(resolved) = resolved else {
            continue;
        };
        if !seen.insert(resolved.clone()) {
            continue;
        }
        let kind = if is_external_path(&resolved) {
            DependencyKind::External
        } else {
            DependencyKind::Local
        };
        dependencies.push(ModuleDependency {
            specifier,
            resolved,
            kind,
        });
    }

    Ok(ModuleRecord {
        source: path.to_path_buf(),
        role: FileRole::from_path(path),
        dependencies,
        exports: scan.exports,
        has_default: scan.has_default,
    })
}

fn build_graph(mut modules: Vec<ModuleRecord>) -> ModuleGraph {
    modules.sort_by(|a, b| a.source.cmp(&b.source));

    let index = modules
        .iter()
        .enumerate()
        .map(|(i, m)| (m.source.clone(), i))
        .collect();

    let mut by_path: FxHashMap<&Path, &ModuleDependency> = FxHashMap::default();
    for dep in modules.iter().flat_map(|m| &m.dependencies) {
        by_path.entry(dep.resolved.as_path()).or_insert(dep);
    }
    let mut dependencies: Vec<ModuleDependency> = by_path.into_values().cloned().collect();
    dependencies.sort_by(|a, b| a.resolved.cmp(&b.resolved));

    ModuleGraph {
        modules,
        index,
        dependencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::path::normalize_path;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn package(root: &Path, name: &str, version: &str, body: &str) {
        write(
            root,
            &format!("node_modules/{name}/package.json"),
            &format!(r#"{{"name":"{name}","version":"{version}","main":"index.js"}}"#),
        );
        write(root, &format!("node_modules/{name}/index.js"), body);
    }

    #[test]
    fn test_collect_classifies_and_dedups() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        package(&root, "dep", "1.0.0", "export default 1;");
        let a = write(&root, "src/a.page.js", "import d from 'dep';\nimport './shared.js';\nexport default 1;");
        let b = write(&root, "src/b.page.js", "import d from 'dep';\nimport './shared.js';\nexport default 2;");
        write(&root, "src/shared.js", "import 'node:fs';\nimport path from 'path';\nexport const s = 1;");

        let graph = collect(&[a.clone(), b], &ModuleResolver::new(), PackageGraph::Follow).unwrap();

        // a, b, shared, dep/index.js
        assert_eq!(graph.modules().len(), 4);
        let deps = graph.dependencies();
        assert_eq!(deps.len(), 2);
        let unique: FxHashSet<_> = deps.iter().map(|d| &d.resolved).collect();
        assert_eq!(unique.len(), deps.len());

        let record = graph.module(&a).unwrap();
        assert_eq!(record.role, Some(FileRole::Page));
        assert!(record.has_default);
        assert_eq!(record.dependencies[0].kind, DependencyKind::External);
        assert_eq!(record.dependencies[1].kind, DependencyKind::Local);
        assert_eq!(graph.external().count(), 1);
    }

    #[test]
    fn test_boundary_mode_stops_at_packages() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        package(&root, "inner", "1.0.0", "export default 1;");
        package(&root, "outer", "1.0.0", "import i from 'inner';\nexport default i;");
        let entry = write(&root, "src/index.page.js", "import o from 'outer';\nexport default o;");

        let follow = collect(&[entry.clone()], &ModuleResolver::new(), PackageGraph::Follow).unwrap();
        assert_eq!(follow.external().count(), 2);

        let boundary = collect(&[entry], &ModuleResolver::new(), PackageGraph::Boundary).unwrap();
        assert_eq!(boundary.external().count(), 1);
        assert_eq!(boundary.modules().len(), 1);
    }

    #[test]
    fn test_closure() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let entry = write(&root, "src/index.page.js", "import './a.js';\nexport default 1;");
        let a = write(&root, "src/a.js", "import './b.js';");
        let b = write(&root, "src/b.js", "import './a.js';");
        let other = write(&root, "src/other.page.js", "export default 1;");

        let graph = collect(&[entry.clone(), other.clone()], &ModuleResolver::new(), PackageGraph::Follow).unwrap();
        let closure = graph.closure([entry.as_path()]);
        assert!(closure.contains(&a) && closure.contains(&b) && closure.contains(&entry));
        assert!(!closure.contains(&other));
    }

    #[test]
    fn test_unresolved_import_names_importer() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let entry = write(&root, "src/index.page.js", "import './missing.js';");

        let err = collect(&[entry], &ModuleResolver::new(), PackageGraph::Follow).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("./missing.js"));
        assert!(message.contains("index.page.js"));
    }
}
