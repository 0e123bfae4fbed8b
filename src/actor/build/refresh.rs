//! Incremental re-collection after source or markdown changes.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::core::Route;
use crate::pipeline::{Builder, Snapshot};

/// Outcome of one refresh: the new snapshot and the route work it implies.
pub struct Refreshed {
    pub snapshot: Arc<Snapshot>,
    /// Routes to hand to the route lanes
    pub regenerate: BTreeSet<Route>,
    /// Routes that no longer exist; their outputs are already gone
    pub removed: Vec<Route>,
}

/// Recompile `paths`, collect a new snapshot and work out which routes
/// changed.
///
/// A route is regenerated when its content, a layout or anything in its
/// import closure changed (before or after the change), when its entry
/// differs from the previous snapshot, or when it is new. A change to the
/// hydration bootstrap touches every route.
pub fn refresh(builder: &Builder, previous: Option<&Snapshot>, paths: &[PathBuf]) -> Result<Refreshed> {
    let source_root = builder.settings().source_root();
    let (sources, outside): (Vec<PathBuf>, Vec<PathBuf>) = paths
        .iter()
        .cloned()
        .partition(|p| p.starts_with(source_root));

    builder.compile(&sources)?;
    let snapshot = builder.prepare()?;

    let mut changed = builder.compiled_paths(&sources);
    changed.extend(outside.iter().cloned());

    let mut regenerate = snapshot.affected_routes(&changed);
    let mut removed = Vec::new();
    match previous {
        Some(prev) => {
            regenerate.extend(
                prev.affected_routes(&changed)
                    .into_iter()
                    .filter(|r| snapshot.routes.get(r).is_some()),
            );
            regenerate.extend(
                snapshot
                    .routes
                    .entries()
                    .filter(|entry| prev.routes.get(&entry.route) != Some(*entry))
                    .map(|entry| entry.route.clone()),
            );
            removed = builder.remove_stale(prev, &snapshot)?;
        }
        None => regenerate.extend(snapshot.all_routes()),
    }
    if !outside.is_empty() {
        regenerate.extend(snapshot.all_routes());
    }

    Ok(Refreshed {
        snapshot,
        regenerate,
        removed,
    })
}
