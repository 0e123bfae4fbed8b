use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Keeps the watcher attached to every desired root.
///
/// Roots that do not exist yet (no `public/`, no `.env`) are attached once
/// they appear; roots that were deleted and recreated are re-attached.
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

fn mode_for(path: &Path) -> RecursiveMode {
    if path.is_dir() {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    }
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            desired: paths,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for path in &self.desired {
            if !path.exists() {
                crate::debug!("watch"; "not yet present: {}", path.display());
                continue;
            }
            watcher.watch(path, mode_for(path))?;
            self.attached.insert(path.clone());
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        self.attached.retain(|path| path.exists());

        for path in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }
            if watcher.watch(path, mode_for(path)).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "attached: {}", path.display());
            }
        }
    }

    #[cfg(test)]
    pub(super) fn is_attached(&self, path: &Path) -> bool {
        self.attached.contains(path)
    }
}
