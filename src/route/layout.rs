//! Layout resolution in two passes.
//!
//! 1. `collect_layouts`: every layout file becomes a candidate with its own
//!    derived route and depth.
//! 2. `resolve_chain`: for one route, keep candidates whose route prefixes the
//!    target route *and* whose directory contains the target file, then keep
//!    one candidate per depth (longest route wins) and order root-first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::SourceFile;
use super::derive::{depth_of, derive_route};
use crate::core::{FileRole, Route};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutRef {
    pub path: PathBuf,
    /// Path relative to its root, `/`-agnostic.
    #[serde(skip)]
    pub rel: PathBuf,
    pub route: Route,
    pub depth: usize,
}

impl LayoutRef {
    /// Directory the layout governs (relative).
    pub fn dir(&self) -> &Path {
        self.rel.parent().unwrap_or(Path::new(""))
    }

    /// Does this layout apply to a target file at `target_rel` with `route`?
    pub fn applies_to(&self, route: &Route, target_rel: &Path) -> bool {
        self.route.contains(route) && target_rel.starts_with(self.dir())
    }
}

/// Pass 1: layout candidates, sorted by relative path.
pub fn collect_layouts(files: &[SourceFile]) -> Vec<LayoutRef> {
    let mut layouts: Vec<LayoutRef> = files
        .iter()
        .filter(|f| f.role == FileRole::Layout)
        .map(|f| LayoutRef {
            path: f.path.clone(),
            rel: f.rel.clone(),
            route: derive_route(&f.rel),
            depth: depth_of(&f.rel),
        })
        .collect();
    layouts.sort_by(|a, b| a.rel.cmp(&b.rel));
    layouts
}

/// Pass 2: the layout chain of one route, outermost first.
///
/// At most one layout per depth; on a depth tie the layout with the longer
/// (more specific) route wins, and on a full tie the first by path.
pub fn resolve_chain(candidates: &[LayoutRef], route: &Route, target_rel: &Path) -> Vec<LayoutRef> {
    let mut by_depth: BTreeMap<usize, &LayoutRef> = BTreeMap::new();

    for candidate in candidates.iter().filter(|l| l.applies_to(route, target_rel)) {
        by_depth
            .entry(candidate.depth)
            .and_modify(|current| {
                if candidate.route.as_str().len() > current.route.as_str().len() {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }

    by_depth.into_values().cloned().collect()
}
