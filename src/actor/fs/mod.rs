//! File system actor.
//!
//! Watches the project and sends settled, categorized batches to the build
//! actor. The watcher starts before the initial build so nothing that
//! changes during it is lost.
//!
//! ```text
//! notify → Debouncer (dedup) → EventClassifier (category) → BuildMsg::Changed
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::{BuildMsg, FileChange};
use crate::config::SettingsHandle;

mod classifier;
mod debouncer;
mod watch_roots;


pub use classifier::categorize;
use classifier::EventClassifier;
use debouncer::Debouncer;
use watch_roots::WatchRoots;

pub struct FsActor {
    /// notify only offers a sync callback
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Dropping the watcher stops events
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    build_tx: mpsc::Sender<BuildMsg>,
    debouncer: Debouncer,
    /// Classification reads the live settings, roots may move on reload
    handle: Arc<SettingsHandle>,
}

impl FsActor {
    /// Start watching immediately. Events buffer until [`run`](Self::run).
    pub fn new(
        paths: Vec<PathBuf>,
        build_tx: mpsc::Sender<BuildMsg>,
        handle: Arc<SettingsHandle>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_roots = WatchRoots::new(paths);
        watch_roots.attach_existing(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            build_tx,
            debouncer: Debouncer::new(),
            handle,
        })
    }

    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            build_tx,
            mut debouncer,
            handle,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    watch_roots.maintain(&mut watcher);
                    let Some(raw) = debouncer.take_if_ready() else {
                        continue;
                    };
                    let changes = EventClassifier::classify(raw, &handle.load());
                    if changes.is_empty() {
                        continue;
                    }
                    log_changes(&changes);
                    if build_tx.send(BuildMsg::Changed(changes)).await.is_err() {
                        break;
                    }
                }
            }
        }
        crate::debug!("watch"; "fs actor stopped");
    }
}

fn log_changes(changes: &[FileChange]) {
    for change in changes {
        crate::debug!(
            "watch";
            "{} {} ({})",
            change.kind.label(),
            change.path.display(),
            change.category.name()
        );
    }
}
