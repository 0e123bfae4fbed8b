use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::actor::messages::{ChangeKind, FileChange};
use crate::config::Settings;
use crate::core::{FileRole, WatchCategory};

/// Turns a raw debounced batch into categorized changes.
///
/// Pipeline: correct_by_existence → filter_actionable → categorize
pub(super) struct EventClassifier;

impl EventClassifier {
    pub(super) fn classify(
        raw: FxHashMap<PathBuf, ChangeKind>,
        settings: &Settings,
    ) -> Vec<FileChange> {
        let mut changes = raw;

        Self::correct_by_existence(&mut changes);
        Self::filter_actionable(&mut changes);

        let mut classified: Vec<FileChange> = changes
            .into_iter()
            .filter_map(|(path, kind)| {
                let category = categorize(&path, settings)?;
                Some(FileChange {
                    path,
                    kind,
                    category,
                })
            })
            .collect();
        classified.sort_by(|a, b| a.path.cmp(&b.path));
        classified
    }

    /// Reconcile event kinds with what is on disk now.
    ///
    /// Atomic saves report Removed for a file that exists again, and short
    /// lived files report Created after they are gone.
    pub(super) fn correct_by_existence(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        let paths: Vec<_> = changes.keys().cloned().collect();
        for path in paths {
            let kind = changes[&path];
            let exists = path.exists();
            match kind {
                ChangeKind::Created if !exists => {
                    crate::debug!("watch"; "discard created (gone): {}", path.display());
                    changes.remove(&path);
                }
                ChangeKind::Modified if !exists => {
                    crate::debug!("watch"; "upgrade modified->removed: {}", path.display());
                    changes.insert(path, ChangeKind::Removed);
                }
                ChangeKind::Removed if exists => {
                    crate::debug!("watch"; "downgrade removed->modified: {}", path.display());
                    changes.insert(path, ChangeKind::Modified);
                }
                _ => {}
            }
        }
    }

    /// Created/Modified must be files. Directory events carry no content.
    pub(super) fn filter_actionable(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
        changes.retain(|path, kind| match kind {
            ChangeKind::Created | ChangeKind::Modified => path.is_file(),
            ChangeKind::Removed => true,
        });
    }
}

/// Category of a changed path, `None` when the change is irrelevant.
///
/// Generated output is never a trigger, so writing it cannot loop.
pub fn categorize(path: &Path, settings: &Settings) -> Option<WatchCategory> {
    let config = &settings.config;
    if path == config.config_path {
        return Some(WatchCategory::Settings);
    }
    if path == config.build.env_file {
        return Some(WatchCategory::Env);
    }
    if path == config.build.compiler.config {
        return Some(WatchCategory::CompilerConfig);
    }
    if config.build.hydrate_script.as_deref() == Some(path) {
        return Some(WatchCategory::Source);
    }
    if path.starts_with(settings.output_root()) || path.starts_with(settings.work_root()) {
        return None;
    }
    if path.starts_with(settings.public_root()) {
        return Some(WatchCategory::Public);
    }
    if path.starts_with(settings.source_root()) {
        return Some(match FileRole::from_path(path) {
            Some(FileRole::Markdown) => WatchCategory::Markdown,
            _ => WatchCategory::Source,
        });
    }
    None
}
