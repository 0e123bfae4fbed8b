//! Structural route conflicts.
//!
//! Fatal in one-shot builds, warnings in watch mode.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::log;
use crate::utils::plural_s;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConflictKind {
    DuplicatePage,
    DuplicateClient,
    DuplicateStatic,
    DuplicateMarkdown,
    DuplicateLayout,
    /// Page defined alongside a static/client pair.
    MixedSources,
    /// Markdown route colliding with a programmatic route.
    MarkdownCollision,
    /// Client module without a static counterpart.
    OrphanClient,
    DuplicateEndpoint,
}

impl ConflictKind {
    pub fn describe(self) -> &'static str {
        match self {
            Self::DuplicatePage => "multiple page definitions",
            Self::DuplicateClient => "multiple client definitions",
            Self::DuplicateStatic => "multiple static definitions",
            Self::DuplicateMarkdown => "multiple markdown files",
            Self::DuplicateLayout => "multiple layouts in one directory",
            Self::MixedSources => "page defined alongside a static/client pair",
            Self::MarkdownCollision => "markdown file collides with a programmatic route",
            Self::OrphanClient => "client module has no matching static module",
            Self::DuplicateEndpoint => "multiple API endpoints with the same method and path",
        }
    }
}

/// Several sources claim one route (or endpoint).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at `{target}`", .kind.describe())]
pub struct RouteConflict {
    pub kind: ConflictKind,
    /// Route (`/events/`) or endpoint (`GET /about/getAboutData`).
    pub target: String,
    /// Paths relative to the source root.
    pub sources: Vec<PathBuf>,
}

impl RouteConflict {
    pub fn new(kind: ConflictKind, target: impl Into<String>, sources: Vec<PathBuf>) -> Self {
        Self {
            kind,
            target: target.into(),
            sources,
        }
    }
}

/// All conflicts of one mapping pass, as a single error.
#[derive(Debug, Clone, Error)]
pub struct ConflictError(pub Vec<RouteConflict>);

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0.len();
        writeln!(f, "{} route conflict{}", n, plural_s(n))?;
        write!(f, "{}", format_conflicts(&self.0))
    }
}

/// Format conflicts as a string (for error messages).
fn format_conflicts(conflicts: &[RouteConflict]) -> String {
    conflicts
        .iter()
        .map(format_single_conflict)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_single_conflict(conflict: &RouteConflict) -> String {
    let mut lines = vec![conflict.to_string()];
    for source in &conflict.sources {
        lines.push(format!("  - {}", source.display()));
    }
    lines.join("\n")
}

/// Print conflicts using the standard log format.
///
/// ```text
/// [conflict] 1 route conflict (2 sources)
/// [route] page defined alongside a static/client pair at `/events/`
///   - events/index.page.js
///   - events/index.static.js
/// ```
pub fn print_conflicts(conflicts: &[RouteConflict]) {
    if conflicts.is_empty() {
        return;
    }

    let total_sources: usize = conflicts.iter().map(|c| c.sources.len()).sum();
    log!("conflict"; "{} route conflict{} ({} source{})",
        conflicts.len(), plural_s(conflicts.len()),
        total_sources, plural_s(total_sources));

    for conflict in conflicts {
        log!("route"; "{}", conflict);
        for source in &conflict.sources {
            eprintln!("  - {}", source.display());
        }
    }
}
