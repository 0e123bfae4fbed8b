//! Route mapper.
//!
//! Turns the compiled file set into the route table:
//!
//! ```text
//! SourceFile[] ──► group by derived route ──► conflicts ──► RouteEntry
//!                                                             │
//! layouts (pass 1) ───────────────────────────► chain (pass 2)┘
//! api modules + graph exports ──► ApiEndpoint[]
//! ```
//!
//! The table is rebuilt wholesale on every mapping pass; entries never
//! reference a previous table.

mod api;
mod conflict;
mod derive;
mod layout;

pub use api::{ApiEndpoint, HttpMethod};
pub use conflict::{ConflictError, ConflictKind, RouteConflict, print_conflicts};
use derive::derive_route;
pub use layout::{LayoutRef, collect_layouts, resolve_chain};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::core::{FileRole, Route};
use crate::graph::ModuleGraph;

/// A classified file: absolute path, path relative to its root, role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub rel: PathBuf,
    pub role: FileRole,
}

impl SourceFile {
    /// `None` for files that are neither modules nor markdown.
    pub fn new(path: PathBuf, rel: PathBuf) -> Option<Self> {
        let role = FileRole::from_path(&path)?;
        Some(Self { path, rel, role })
    }

    pub fn route(&self) -> Route {
        derive_route(&self.rel)
    }
}

/// What renders a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource<'a> {
    Page(&'a Path),
    /// Static module is both component and data.
    Static(&'a Path),
    Hydrated { client: &'a Path, data: &'a Path },
    Markdown(&'a Path),
}

impl ContentSource<'_> {
    /// Renderer tag injected into props.
    pub fn renderer(&self) -> &'static str {
        match self {
            Self::Page(_) => "page",
            Self::Static(_) => "static",
            Self::Hydrated { .. } => "hydrate",
            Self::Markdown(_) => "markdown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub route: Route,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<PathBuf>,
    #[serde(rename = "static", skip_serializing_if = "Option::is_none")]
    pub static_entry: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<PathBuf>,
    pub layouts: Vec<LayoutRef>,
    /// Relative path of the primary content file, used for layout matching.
    #[serde(skip)]
    pub rel: PathBuf,
}

impl RouteEntry {
    fn empty(route: Route, rel: PathBuf) -> Self {
        Self {
            route,
            page: None,
            client: None,
            static_entry: None,
            markdown: None,
            layouts: Vec::new(),
            rel,
        }
    }

    /// The single content source. Entries built by `map_routes` always have one.
    pub fn source(&self) -> Option<ContentSource<'_>> {
        if let Some(page) = &self.page {
            return Some(ContentSource::Page(page));
        }
        match (&self.client, &self.static_entry) {
            (Some(client), Some(data)) => return Some(ContentSource::Hydrated { client, data }),
            (None, Some(data)) => return Some(ContentSource::Static(data)),
            _ => {}
        }
        self.markdown.as_deref().map(ContentSource::Markdown)
    }

    /// Modules the browser loads for this route: the client entry and its
    /// layouts on hydrated routes, nothing otherwise.
    pub fn browser_entries(&self) -> Vec<&Path> {
        match self.source() {
            Some(ContentSource::Hydrated { client, .. }) => {
                std::iter::once(client)
                    .chain(self.layouts.iter().map(|l| l.path.as_path()))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Every file this entry renders from (content + layouts).
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        [&self.page, &self.client, &self.static_entry, &self.markdown]
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
            .chain(self.layouts.iter().map(|l| l.path.as_path()))
    }
}

/// Result of one mapping pass.
#[derive(Debug, Default, Serialize)]
pub struct RouteTable {
    routes: BTreeMap<Route, RouteEntry>,
    endpoints: Vec<ApiEndpoint>,
    #[serde(skip)]
    conflicts: Vec<RouteConflict>,
}

impl RouteTable {
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.values()
    }

    pub fn get(&self, route: &Route) -> Option<&RouteEntry> {
        self.routes.get(route)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.keys()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn endpoints(&self) -> &[ApiEndpoint] {
        &self.endpoints
    }

    pub fn conflicts(&self) -> &[RouteConflict] {
        &self.conflicts
    }

    /// Fail on any conflict (one-shot builds).
    pub fn check(&self) -> Result<(), ConflictError> {
        if self.conflicts.is_empty() {
            Ok(())
        } else {
            Err(ConflictError(self.conflicts.clone()))
        }
    }
}

/// Content files claiming one route, in sorted path order.
#[derive(Default)]
struct Claims<'a> {
    page: Vec<&'a SourceFile>,
    client: Vec<&'a SourceFile>,
    data: Vec<&'a SourceFile>,
    markdown: Vec<&'a SourceFile>,
}

impl<'a> Claims<'a> {
    fn push(&mut self, file: &'a SourceFile) {
        match file.role {
            FileRole::Page => self.page.push(file),
            FileRole::Client => self.client.push(file),
            FileRole::Static => self.data.push(file),
            FileRole::Markdown => self.markdown.push(file),
            _ => {}
        }
    }

    fn programmatic(&self) -> impl Iterator<Item = &'a SourceFile> + '_ {
        self.page.iter().chain(&self.client).chain(&self.data).copied()
    }
}

/// Build the route table from classified files.
///
/// Conflicts are recorded, not returned early; the caller decides whether
/// they are fatal. On conflict the entry keeps one source by precedence
/// (page, then static/client pair, then markdown; first path on duplicates)
/// so watch mode can keep serving the rest of the site.
pub fn map_routes(files: &[SourceFile], graph: &ModuleGraph) -> RouteTable {
    let mut sorted: Vec<&SourceFile> = files.iter().collect();
    sorted.sort_by(|a, b| a.rel.cmp(&b.rel));

    let mut claims: BTreeMap<Route, Claims<'_>> = BTreeMap::new();
    for file in sorted.iter().filter(|f| f.role.is_content()) {
        claims.entry(file.route()).or_default().push(file);
    }

    let mut conflicts = Vec::new();
    let layouts = dedup_layouts(collect_layouts(files), &mut conflicts);

    let mut routes = BTreeMap::new();
    for (route, claim) in claims {
        if let Some(mut entry) = resolve_claims(&route, &claim, &mut conflicts) {
            entry.layouts = resolve_chain(&layouts, &route, &entry.rel);
            routes.insert(route, entry);
        }
    }

    let endpoints = collect_endpoints(&sorted, graph, &mut conflicts);

    RouteTable {
        routes,
        endpoints,
        conflicts,
    }
}

fn rels(files: &[&SourceFile]) -> Vec<PathBuf> {
    files.iter().map(|f| f.rel.clone()).collect()
}

fn resolve_claims(
    route: &Route,
    claim: &Claims<'_>,
    conflicts: &mut Vec<RouteConflict>,
) -> Option<RouteEntry> {
    let target = route.as_str();
    let duplicates = [
        (ConflictKind::DuplicatePage, &claim.page),
        (ConflictKind::DuplicateClient, &claim.client),
        (ConflictKind::DuplicateStatic, &claim.data),
        (ConflictKind::DuplicateMarkdown, &claim.markdown),
    ];
    for (kind, files) in duplicates {
        if files.len() > 1 {
            conflicts.push(RouteConflict::new(kind, target, rels(files)));
        }
    }

    let programmatic: Vec<&SourceFile> = claim.programmatic().collect();
    if !claim.markdown.is_empty() && !programmatic.is_empty() {
        let mut sources = rels(&claim.markdown);
        sources.extend(rels(&programmatic));
        conflicts.push(RouteConflict::new(ConflictKind::MarkdownCollision, target, sources));
    }

    if let Some(page) = claim.page.first() {
        if !claim.client.is_empty() || !claim.data.is_empty() {
            let mut sources = vec![page.rel.clone()];
            sources.extend(rels(&claim.client));
            sources.extend(rels(&claim.data));
            conflicts.push(RouteConflict::new(ConflictKind::MixedSources, target, sources));
        }
        let mut entry = RouteEntry::empty(route.clone(), page.rel.clone());
        entry.page = Some(page.path.clone());
        return Some(entry);
    }

    if let Some(client) = claim.client.first()
        && claim.data.is_empty()
    {
        conflicts.push(RouteConflict::new(
            ConflictKind::OrphanClient,
            target,
            vec![client.rel.clone()],
        ));
    }

    if let Some(data) = claim.data.first() {
        let mut entry = RouteEntry::empty(route.clone(), data.rel.clone());
        entry.static_entry = Some(data.path.clone());
        entry.client = claim.client.first().map(|c| c.path.clone());
        return Some(entry);
    }

    if !claim.client.is_empty() {
        return None;
    }

    claim.markdown.first().map(|md| {
        let mut entry = RouteEntry::empty(route.clone(), md.rel.clone());
        entry.markdown = Some(md.path.clone());
        entry
    })
}

/// Two layouts governing the same directory with the same route.
fn dedup_layouts(layouts: Vec<LayoutRef>, conflicts: &mut Vec<RouteConflict>) -> Vec<LayoutRef> {
    let mut seen: FxHashMap<(PathBuf, Route), usize> = FxHashMap::default();
    let mut kept: Vec<LayoutRef> = Vec::with_capacity(layouts.len());
    let mut dupes: BTreeMap<usize, Vec<PathBuf>> = BTreeMap::new();

    for layout in layouts {
        let key = (layout.dir().to_path_buf(), layout.route.clone());
        match seen.get(&key) {
            Some(&i) => dupes.entry(i).or_default().push(layout.rel),
            None => {
                seen.insert(key, kept.len());
                kept.push(layout);
            }
        }
    }

    for (i, rest) in dupes {
        let mut sources = vec![kept[i].rel.clone()];
        sources.extend(rest);
        conflicts.push(RouteConflict::new(
            ConflictKind::DuplicateLayout,
            kept[i].route.as_str(),
            sources,
        ));
    }
    kept
}

fn collect_endpoints(
    files: &[&SourceFile],
    graph: &ModuleGraph,
    conflicts: &mut Vec<RouteConflict>,
) -> Vec<ApiEndpoint> {
    let mut by_key: BTreeMap<String, Vec<ApiEndpoint>> = BTreeMap::new();

    for file in files.iter().filter(|f| f.role == FileRole::Api) {
        let Some(record) = graph.module(&file.path) else {
            continue;
        };
        let route = file.route();
        for export in &record.exports {
            let endpoint = ApiEndpoint::new(&route, export, file.path.clone(), file.rel.clone());
            by_key.entry(endpoint.key()).or_default().push(endpoint);
        }
    }

    let mut endpoints = Vec::with_capacity(by_key.len());
    for (key, mut group) in by_key {
        if group.len() > 1 {
            let sources = group.iter().map(|e| e.rel.clone()).collect();
            conflicts.push(RouteConflict::new(ConflictKind::DuplicateEndpoint, key, sources));
        }
        endpoints.push(group.swap_remove(0));
    }
    endpoints.sort_by(|a, b| a.path.cmp(&b.path).then(a.method.cmp(&b.method)));
    endpoints
}
