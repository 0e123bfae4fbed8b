//! Build pipeline.
//!
//! ```text
//! sources ─► Compiler ─► compiled root ─┐
//! markdown ─────────────────────────────┼─► Snapshot::collect
//!                                       │     graph ─► routes ─► externalize
//!                                       ▼
//!                          enforce ─► vendor ─► UnitPool (one unit per route)
//! ```
//!
//! The orchestrator owns the current `Arc<Snapshot>` and replaces it after
//! every collection pass; route units only ever read one.

mod build;
mod error;
mod manifest;
mod public;
mod snapshot;

pub use build::{Builder, UnitSummary, remove_route_output};
pub use error::BuildError;
pub use public::{mirror_public, public_output, sync_public_file};
pub use snapshot::Snapshot;
