//! Package identity lookup from `package.json`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::graph::is_external_path;

/// `name@version` of an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Output directory name: `react@18.2.0`, `@scope/pkg@1.0.0`.
    pub fn dir_name(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A package root and its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub root: PathBuf,
    pub id: PackageId,
}

#[derive(Deserialize)]
struct Manifest {
    name: Option<String>,
    version: Option<String>,
}

/// Directory → package lookup, shared by parallel callers.
///
/// Nested `package.json` files without a `name` (e.g. `dist/esm/package.json`
/// carrying only `"type"`) are skipped on the way up.
#[derive(Debug, Default)]
pub struct PackageCache {
    dirs: DashMap<PathBuf, Option<Arc<PackageInfo>>>,
}

impl PackageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Package containing `file`, when it lives inside a `node_modules` tree.
    pub fn package_of(&self, file: &Path) -> Option<Arc<PackageInfo>> {
        if !is_external_path(file) {
            return None;
        }
        let dir = file.parent()?;
        self.lookup_dir(dir)
    }

    fn lookup_dir(&self, dir: &Path) -> Option<Arc<PackageInfo>> {
        if let Some(hit) = self.dirs.get(dir) {
            return hit.clone();
        }

        let found = if dir.file_name().is_some_and(|n| n == "node_modules") {
            None
        } else {
            match read_manifest(dir) {
                Some(info) => Some(Arc::new(info)),
                None => dir.parent().and_then(|parent| self.lookup_dir(parent)),
            }
        };

        self.dirs.insert(dir.to_path_buf(), found.clone());
        found
    }

    pub fn clear(&self) {
        self.dirs.clear();
    }
}

fn read_manifest(dir: &Path) -> Option<PackageInfo> {
    let content = std::fs::read_to_string(dir.join("package.json")).ok()?;
    let manifest: Manifest = serde_json::from_str(&content).ok()?;
    let name = manifest.name?;
    Some(PackageInfo {
        root: dir.to_path_buf(),
        id: PackageId::new(name, manifest.version.unwrap_or_else(|| "0.0.0".into())),
    })
}
