//! Client/server boundary check.
//!
//! A module reachable from a client-facing entry (client or layout) must not
//! statically import a server-only module (server, static, api).

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use super::{DependencyKind, ModuleGraph};
use crate::core::FileRole;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BoundaryViolation {
    /// Server-only module that leaked.
    pub module: PathBuf,
    /// Module containing the offending import.
    pub importer: PathBuf,
    /// Client-facing entry it is reachable from.
    pub entry: PathBuf,
}

impl fmt::Display for BoundaryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "server-only module `{}` is imported by `{}` (reachable from client entry `{}`)",
            self.module.display(),
            self.importer.display(),
            self.entry.display()
        )
    }
}

/// Report every (module, importer) pair that crosses the boundary, once.
pub fn check_boundaries(graph: &ModuleGraph) -> Vec<BoundaryViolation> {
    let mut reported: FxHashSet<(&Path, &Path)> = FxHashSet::default();
    let mut violations = Vec::new();

    let entries = graph
        .modules()
        .iter()
        .filter(|m| m.role.is_some_and(FileRole::is_client_facing));

    for entry in entries {
        let mut parent: FxHashMap<&Path, &Path> = FxHashMap::default();
        let mut queue = VecDeque::from([entry.source.as_path()]);
        parent.insert(entry.source.as_path(), entry.source.as_path());

        while let Some(path) = queue.pop_front() {
            let Some(record) = graph.module(path) else {
                continue;
            };
            for dep in &record.dependencies {
                if dep.kind != DependencyKind::Local {
                    continue;
                }
                let target = dep.resolved.as_path();
                let server_only =
                    FileRole::from_path(target).is_some_and(FileRole::is_server_only);
                if server_only {
                    if reported.insert((target, path)) {
                        violations.push(BoundaryViolation {
                            module: target.to_path_buf(),
                            importer: path.to_path_buf(),
                            entry: entry.source.clone(),
                        });
                    }
                    continue;
                }
                if !parent.contains_key(target) {
                    parent.insert(target, path);
                    queue.push_back(target);
                }
            }
        }
    }

    violations.sort();
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackageGraph;
    use crate::graph::{ModuleResolver, collect};
    use crate::utils::path::normalize_path;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_transitive_server_import_reported() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let client = write(&root, "src/about/index.client.js", "import './widget.js';\nexport default 1;");
        let widget = write(&root, "src/about/widget.js", "import { q } from '../db.server.js';");
        write(&root, "src/db.server.js", "export const q = 1;");

        let graph = collect(&[client.clone()], &ModuleResolver::new(), PackageGraph::Follow).unwrap();
        let violations = check_boundaries(&graph);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].module, root.join("src/db.server.js"));
        assert_eq!(violations[0].importer, widget);
        assert_eq!(violations[0].entry, client);
        assert!(violations[0].to_string().contains("db.server.js"));
    }

    #[test]
    fn test_page_may_import_server_modules() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let page = write(&root, "src/index.page.js", "import { q } from './db.server.js';\nexport default 1;");
        let layout = write(&root, "src/index.layout.js", "import './util.js';\nexport default 1;");
        write(&root, "src/util.js", "export const u = 1;");
        write(&root, "src/db.server.js", "export const q = 1;");

        let graph = collect(&[page, layout], &ModuleResolver::new(), PackageGraph::Follow).unwrap();
        assert!(check_boundaries(&graph).is_empty());
    }

    #[test]
    fn test_layout_importing_static_is_violation() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let layout = write(&root, "src/index.layout.js", "import d from './index.static.js';\nexport default d;");
        write(&root, "src/index.static.js", "export default 1;");

        let graph = collect(&[layout], &ModuleResolver::new(), PackageGraph::Follow).unwrap();
        assert_eq!(check_boundaries(&graph).len(), 1);
    }
}
