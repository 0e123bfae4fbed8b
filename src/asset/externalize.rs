//! Version-qualified output paths for every dependency the pages load.
//!
//! ```text
//! node_modules/react/index.js           -> dist/_external/react@18.2.0/index.js
//! node_modules/a/node_modules/react/... -> dist/_external/react@17.0.2/...
//! runtime/hydrate.js (local, outside)   -> dist/runtime/hydrate.js
//! .trellis/src/lib/util.js (compiled)   -> dist/src/lib/util.js (browser-facing only)
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::package::{PackageCache, PackageId, PackageInfo};
use crate::config::Settings;
use crate::core::FileRole;
use crate::graph::{DependencyKind, ModuleGraph};

#[derive(Debug, Error)]
pub enum ExternalizeError {
    #[error("`{0}` is inside node_modules but has no package.json with a name")]
    NoPackage(PathBuf),

    #[error("local dependency `{0}` is outside the project root")]
    OutsideRoot(PathBuf),
}

/// Package name → versions in use.
#[derive(Debug, Default, Clone)]
pub struct VersionMap {
    versions: BTreeMap<String, BTreeSet<String>>,
}

impl VersionMap {
    fn insert(&mut self, id: &PackageId) {
        self.versions
            .entry(id.name.clone())
            .or_default()
            .insert(id.version.clone());
    }

    /// Packages loaded at more than one version, with those versions.
    pub fn duplicated(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.versions
            .iter()
            .filter(|(_, set)| set.len() > 1)
            .map(|(name, set)| (name.as_str(), set.iter().map(String::as_str).collect()))
    }

    /// Number of distinct `name@version` pairs.
    pub fn len(&self) -> usize {
        self.versions.values().map(BTreeSet::len).sum()
    }
}

/// A directory or file to copy into the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyJob {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Where every dependency file lives in the output tree.
#[derive(Debug, Default)]
pub struct Externalized {
    pub versions: VersionMap,
    outputs: FxHashMap<PathBuf, PathBuf>,
    compiled_root: PathBuf,
    published_root: PathBuf,
    /// Package roots → `<external>/<name>@<version>`.
    pub packages: Vec<CopyJob>,
    /// Local files outside the compiled root.
    pub local: Vec<CopyJob>,
    /// Browser-facing compiled modules → published root.
    pub published: Vec<CopyJob>,
}

impl Externalized {
    /// Output path of a resolved dependency or compiled module.
    ///
    /// Compiled modules map into the published root whether or not they are
    /// published; only [`Externalized::publish`] decides what is copied.
    pub fn output_of(&self, resolved: &Path) -> PathBuf {
        if let Some(output) = self.outputs.get(resolved) {
            return output.clone();
        }
        match resolved.strip_prefix(&self.compiled_root) {
            Ok(rel) if !self.compiled_root.as_os_str().is_empty() => self.published_root.join(rel),
            _ => resolved.to_path_buf(),
        }
    }

    /// Output directory of the package rooted at `root`.
    pub fn package_dir(&self, root: &Path) -> Option<&Path> {
        self.packages
            .iter()
            .find(|job| job.from == root)
            .map(|job| job.to.as_path())
    }

    /// Plan copies of the compiled modules among `files` (the browser's
    /// closure). Server-only modules are never published, even when a
    /// boundary violation makes them reachable.
    pub fn publish<'a>(&mut self, files: impl IntoIterator<Item = &'a Path>) {
        for file in files {
            let Ok(rel) = file.strip_prefix(&self.compiled_root) else {
                continue;
            };
            if FileRole::from_path(file).is_some_and(FileRole::is_server_only) {
                continue;
            }
            self.published.push(CopyJob {
                from: file.to_path_buf(),
                to: self.published_root.join(rel),
            });
        }
        self.published.sort_by(|a, b| a.from.cmp(&b.from));
        self.published.dedup();
    }
}

/// Assign output paths to every dependency of `graph`, plus `extra` local
/// files (runtime support scripts).
pub fn externalize(
    graph: &ModuleGraph,
    extra: &[PathBuf],
    settings: &Settings,
    cache: &PackageCache,
) -> Result<Externalized, ExternalizeError> {
    let external_root = settings.external_root();
    let compiled_root = settings.compiled_root();

    let mut out = Externalized {
        compiled_root: compiled_root.clone(),
        published_root: settings.published_root(),
        ..Externalized::default()
    };
    let mut roots: BTreeMap<PathBuf, Arc<PackageInfo>> = BTreeMap::new();

    for dep in graph.dependencies() {
        match dep.kind {
            DependencyKind::External => {
                let info = cache
                    .package_of(&dep.resolved)
                    .ok_or_else(|| ExternalizeError::NoPackage(dep.resolved.clone()))?;
                let inner = dep.resolved.strip_prefix(&info.root).unwrap_or(&dep.resolved);
                let output = external_root.join(info.id.dir_name()).join(inner);
                out.outputs.insert(dep.resolved.clone(), output);
                roots.entry(info.root.clone()).or_insert(info);
            }
            DependencyKind::Local => {
                add_local(&mut out, &dep.resolved, &compiled_root, settings)?;
            }
        }
    }
    for file in extra {
        add_local(&mut out, file, &compiled_root, settings)?;
    }

    for (root, info) in roots {
        out.versions.insert(&info.id);
        out.packages.push(CopyJob {
            to: external_root.join(info.id.dir_name()),
            from: root,
        });
    }
    out.local.sort_by(|a, b| a.from.cmp(&b.from));
    out.local.dedup();
    Ok(out)
}

fn add_local(
    out: &mut Externalized,
    file: &Path,
    compiled_root: &Path,
    settings: &Settings,
) -> Result<(), ExternalizeError> {
    if file.starts_with(compiled_root) || out.outputs.contains_key(file) {
        return Ok(());
    }
    let rel = file
        .strip_prefix(settings.root())
        .map_err(|_| ExternalizeError::OutsideRoot(file.to_path_buf()))?;
    let to = settings.output_root().join(rel);
    out.outputs.insert(file.to_path_buf(), to.clone());
    out.local.push(CopyJob {
        from: file.to_path_buf(),
        to,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PackageGraph, test_settings};
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

    fn package(root: &Path, dir: &str, name: &str, version: &str) {
        write(
            root,
            &format!("{dir}/package.json"),
            &format!(r#"{{"name":"{name}","version":"{version}","main":"index.js"}}"#),
        );
        write(root, &format!("{dir}/index.js"), "export default 1;");
    }

    #[test]
    fn test_two_versions_get_distinct_paths() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let settings = test_settings(&root, "");

        package(&root, "node_modules/lib", "lib", "2.0.0");
        package(&root, "node_modules/old/node_modules/lib", "lib", "1.0.0");
        write(
            &root,
            "node_modules/old/package.json",
            r#"{"name":"old","version":"0.1.0","main":"index.js"}"#,
        );
        write(&root, "node_modules/old/index.js", "import lib from 'lib';\nexport default lib;");

        let compiled = settings.compiled_root();
        let a = write(&compiled, "a.page.js", "import lib from 'lib';\nexport default lib;");
        let b = write(&compiled, "b.page.js", "import old from 'old';\nexport default old;");

        let graph = collect(&[a, b], &ModuleResolver::new(), PackageGraph::Follow).unwrap();
        let ext = externalize(&graph, &[], &settings, &PackageCache::new()).unwrap();

        let duplicated: Vec<_> = ext.versions.duplicated().collect();
        assert_eq!(duplicated, vec![("lib", vec!["1.0.0", "2.0.0"])]);
        assert_eq!(ext.versions.len(), 3);

        let new_lib = root.join("node_modules/lib/index.js");
        let old_lib = root.join("node_modules/old/node_modules/lib/index.js");
        let external = settings.external_root();
        assert_eq!(ext.output_of(&new_lib), external.join("lib@2.0.0/index.js"));
        assert_eq!(ext.output_of(&old_lib), external.join("lib@1.0.0/index.js"));
        assert_eq!(ext.packages.len(), 3);
        assert_eq!(
            ext.package_dir(&root.join("node_modules/old")),
            Some(external.join("old@0.1.0").as_path())
        );
    }

    #[test]
    fn test_local_files() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let settings = test_settings(&root, "");

        let compiled = settings.compiled_root();
        let util = write(&compiled, "lib/util.js", "export const x = 1;");
        let page = write(&compiled, "index.page.js", "import { x } from './lib/util.js';\nexport default x;");
        let hydrate = write(&root, "runtime/hydrate.js", "");

        let graph = collect(&[page], &ModuleResolver::new(), PackageGraph::Follow).unwrap();
        let ext = externalize(&graph, &[hydrate.clone()], &settings, &PackageCache::new()).unwrap();

        assert_eq!(ext.output_of(&util), settings.published_root().join("lib/util.js"));
        assert_eq!(ext.output_of(&hydrate), settings.output_root().join("runtime/hydrate.js"));
        assert_eq!(ext.local.len(), 1);
        assert_eq!(ext.versions.len(), 0);
        // nothing compiled is copied until it is published
        assert!(ext.published.is_empty());
    }

    #[test]
    fn test_publish_skips_server_only_modules() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let settings = test_settings(&root, "");

        let compiled = settings.compiled_root();
        let client = compiled.join("index.client.js");
        let util = compiled.join("lib/util.js");
        let server = compiled.join("db.server.js");
        let vendored = root.join("node_modules/lib/index.js");

        let mut ext = externalize(&ModuleGraph::default(), &[], &settings, &PackageCache::new()).unwrap();
        ext.publish([client.as_path(), util.as_path(), server.as_path(), vendored.as_path(), client.as_path()]);

        let published = settings.published_root();
        assert_eq!(
            ext.published,
            vec![
                CopyJob { from: client, to: published.join("index.client.js") },
                CopyJob { from: util, to: published.join("lib/util.js") },
            ]
        );
    }

    #[test]
    fn test_outside_root_is_error() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let settings = test_settings(&normalize_path(dir.path()), "");
        let stray = write(&normalize_path(other.path()), "x.js", "");

        let err = externalize(&ModuleGraph::default(), &[stray], &settings, &PackageCache::new())
            .unwrap_err();
        assert!(matches!(err, ExternalizeError::OutsideRoot(_)));
    }
}
