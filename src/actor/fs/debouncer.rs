use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::actor::messages::ChangeKind;
use crate::utils::path::normalize_path;

/// Quiet period before a raw batch is handed to the classifier.
///
/// Short on purpose: the build actor's lanes apply the configured debounce.
pub(super) const SETTLE_MS: u64 = 50;

/// Pure deduplication of notify events. No classification, no global state.
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    settle: Duration,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self::with_settle(Duration::from_millis(SETTLE_MS))
    }

    pub(super) fn with_settle(settle: Duration) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            settle,
        }
    }

    /// Add a notify event.
    ///
    /// - Removed then Created/Modified: restored, keep the new kind
    /// - Modified then Removed: Removed
    /// - Created then Removed: dropped
    /// - anything else: first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // mtime/chmod noise
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);
            self.record(path, kind);
        }
    }

    fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        if let Some(&existing) = self.changes.get(&path) {
            match (existing, kind) {
                (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                    crate::debug!("watch"; "restore {}->{}: {}", existing.label(), kind.label(), path.display());
                    self.changes.insert(path, kind);
                }
                (ChangeKind::Modified, ChangeKind::Removed) => {
                    crate::debug!("watch"; "upgrade modified->removed: {}", path.display());
                    self.changes.insert(path, ChangeKind::Removed);
                }
                (ChangeKind::Created, ChangeKind::Removed) => {
                    crate::debug!("watch"; "discard created+removed: {}", path.display());
                    self.changes.remove(&path);
                }
                _ => return,
            }
        } else {
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
        }
        self.last_event = Some(Instant::now());
    }

    /// Take the batch once no event arrived for the settle window.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        let last = self.last_event?;
        if last.elapsed() < self.settle {
            return None;
        }
        // also resets the timer after a batch that cancelled itself out
        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);
        (!changes.is_empty()).then_some(changes)
    }

    #[cfg(test)]
    pub(super) fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= self.settle && !self.changes.is_empty())
    }

    /// Sleep until the batch could be ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        self.settle
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Editor artifacts: swap files, backups, dotfiles.
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || (name.starts_with('.') && !name.starts_with(".env"))
}
