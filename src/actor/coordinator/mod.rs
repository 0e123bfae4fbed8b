//! Wires the watch-mode actors together and runs them.

mod runtime;
mod watch_paths;

use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::build::BuildActor;
use super::fs::FsActor;
use super::messages::BuildMsg;
use crate::config::SettingsHandle;

const CHANNEL_BUFFER: usize = 32;

pub struct Coordinator {
    handle: Arc<SettingsHandle>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(handle: Arc<SettingsHandle>) -> Self {
        Self {
            handle,
            shutdown_rx: None,
        }
    }

    /// Stop when this receiver fires (Ctrl+C).
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    pub async fn run(self) -> Result<()> {
        let (build_tx, build_rx) = mpsc::channel::<BuildMsg>(CHANNEL_BUFFER);

        // watcher first: changes made during the initial build are queued
        let paths = watch_paths::collect_watch_paths(&self.handle.load());
        crate::debug_do! {
            for path in &paths {
                crate::debug!("watch"; "watching {}", path.display());
            }
        }
        let fs_actor = FsActor::new(paths, build_tx.clone(), Arc::clone(&self.handle))
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        let build_actor = BuildActor::new(build_rx, Arc::clone(&self.handle));

        crate::debug!("actor"; "start");
        runtime::run_actors(fs_actor, build_actor, build_tx, self.shutdown_rx).await;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
