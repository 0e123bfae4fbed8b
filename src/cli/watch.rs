//! `trellis watch`: initial build, then incremental rebuilds until Ctrl+C.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::{Cli, load_settings};
use crate::actor::Coordinator;
use crate::config::SettingsHandle;
use crate::core::{BuildMode, register_watch};
use crate::log;

pub fn watch_site(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli, BuildMode::WATCH)?;
    let source = settings.config.root_relative(settings.source_root());
    let handle = Arc::new(SettingsHandle::new(settings));

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    register_watch(shutdown_tx);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    log!("watch"; "watching `{}`, press Ctrl+C to stop", source.display());
    rt.block_on(async {
        Coordinator::new(handle)
            .with_shutdown_signal(shutdown_rx)
            .run()
            .await
    })
}
