use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::build::BuildActor;
use crate::actor::fs::FsActor;
use crate::actor::messages::BuildMsg;

/// Upper bound on waiting for in-flight work after shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Run both actors until shutdown or until one of them stops.
pub(super) async fn run_actors(
    fs: FsActor,
    build: BuildActor,
    build_tx: mpsc::Sender<BuildMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let mut build_handle = tokio::spawn(async move { build.run().await });
    let fs_handle = tokio::spawn(async move { fs.run().await });

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() || crate::core::is_shutdown() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            if build_handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        tokio::select! {
            _ = fs_handle => {}
            _ = &mut build_handle => return,
        }
    }

    let _ = build_tx.send(BuildMsg::Shutdown).await;
    if tokio::time::timeout(DRAIN_TIMEOUT, build_handle).await.is_err() {
        crate::log!("watch"; "gave up waiting for running builds");
    }
}
