//! What a settled change of each category rebuilds.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::actor::messages::FileChange;
use crate::core::WatchCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Re-derive settings, rebuild everything
    Full,
    /// Recompile changed sources, re-collect, regenerate affected routes
    Refresh,
    /// Mirror changed passthrough files
    Public,
}

impl Scope {
    pub fn of(category: WatchCategory) -> Self {
        match category {
            WatchCategory::Settings | WatchCategory::Env | WatchCategory::CompilerConfig => {
                Self::Full
            }
            WatchCategory::Source | WatchCategory::Markdown => Self::Refresh,
            WatchCategory::Public => Self::Public,
        }
    }

    /// Whether route units must wait while this scope runs.
    pub fn blocks_routes(self) -> bool {
        !matches!(self, Self::Public)
    }
}

/// Changed paths waiting for their category lane to fire.
#[derive(Debug, Default)]
pub struct PendingPaths {
    paths: BTreeMap<WatchCategory, BTreeSet<PathBuf>>,
}

impl PendingPaths {
    pub fn add(&mut self, change: &FileChange) {
        self.paths
            .entry(change.category)
            .or_default()
            .insert(change.path.clone());
    }

    pub fn take(&mut self, category: WatchCategory) -> Vec<PathBuf> {
        self.paths
            .remove(&category)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default()
    }

    /// A full rebuild covers every pending change.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    #[cfg(test)]
    pub fn is_empty(&self, category: WatchCategory) -> bool {
        self.paths.get(&category).is_none_or(BTreeSet::is_empty)
    }
}

/// Pick the next category to run among the due ones: global categories
/// first, since a full rebuild subsumes the rest.
pub fn next_due(due: &[WatchCategory]) -> Option<WatchCategory> {
    due.iter()
        .copied()
        .find(|c| c.is_global())
        .or_else(|| due.first().copied())
}
