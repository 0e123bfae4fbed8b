//! Process-wide shutdown state.
//!
//! Set by the Ctrl+C handler, polled by the watch loop and the unit pool.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Whether a watch session is running (graceful shutdown instead of exit)
static WATCHING: AtomicBool = AtomicBool::new(false);

/// Shutdown signal sender for actor system
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// - Before `register_watch()`: exit immediately
/// - After `register_watch()`: set the flag and notify the actors
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        if WATCHING.load(Ordering::SeqCst) {
            crate::log!("watch"; "shutting down...");
        } else {
            std::process::exit(130);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the watch session for graceful shutdown.
pub fn register_watch(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
    WATCHING.store(true, Ordering::SeqCst);
}

/// Check if shutdown has been requested.
///
/// Relaxed: worst case a few more jobs start before stopping.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
pub fn reset_shutdown() {
    SHUTDOWN.store(false, Ordering::SeqCst);
}
