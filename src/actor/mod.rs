//! Watch-mode actors.
//!
//! ```text
//! FsActor ──BuildMsg──► BuildActor ──spawn_blocking──► Builder / UnitPool
//! (notify)               (lanes)
//! ```
//!
//! - `messages` - what the actors exchange
//! - `fs` - watcher, dedup, categorization
//! - `build` - debounce lanes, rebuild scopes, snapshot ownership
//! - `coordinator` - wiring and shutdown

pub mod build;
pub mod coordinator;
pub mod fs;
pub mod messages;

pub use coordinator::Coordinator;
