//! Actor message definitions.
//!
//! ```text
//! FsActor --Changed--> BuildActor
//! ```

use std::path::PathBuf;

use crate::core::WatchCategory;

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// One debounced, classified file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub category: WatchCategory,
}

/// Messages to the build actor.
#[derive(Debug)]
pub enum BuildMsg {
    /// A settled batch of file changes
    Changed(Vec<FileChange>),
    /// Stop scheduling; finish running work and exit
    Shutdown,
}
