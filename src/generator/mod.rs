//! Static generator: one route in, one HTML + sidecar pair out.
//!
//! ```text
//! RouteEntry ─► content source ─► describe + validate ─► props (+ injected)
//!                                                           │
//!          layouts (root first) ─► same, per layout ────────┤
//!                                                           ▼
//!                         compose ─► Renderer ─► head/shell ─► write pair
//! ```
//!
//! A unit only reads its `Snapshot`; the files it writes belong to its route.

mod compose;
mod error;
mod head;
mod host;
mod markdown;
mod runtime;
mod sidecar;
mod write;

pub use compose::{Injected, compose, inject};
pub use error::UnitError;
pub use head::{assemble_head, bootstrap_script, document};
pub use host::{
    Element, HostError, LayoutDescriptor, LocationInfo, ModuleDescriptor, ModuleHost, PropsContext,
    RenderOutput, RenderRequest, Renderer, Validated,
};
pub use markdown::MarkdownDoc;
pub use runtime::CommandRuntime;
pub use sidecar::{PageData, Sidecar};
pub use write::write_atomic;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::asset::{ImportMap, preload_urls};
use crate::config::Settings;
use crate::core::Route;
use crate::pipeline::Snapshot;
use crate::route::{ContentSource, RouteEntry};
use crate::utils::path::to_slash;

/// Module host and renderer shared by all units.
#[derive(Clone)]
pub struct Collaborators {
    pub host: Arc<dyn ModuleHost>,
    pub renderer: Arc<dyn Renderer>,
}

impl Collaborators {
    /// The `[build.runtime]` command for both roles.
    pub fn from_settings(settings: &Settings) -> Self {
        let runtime = Arc::new(CommandRuntime::new(
            settings.config.build.runtime.command.clone(),
            settings.root(),
        ));
        Self {
            host: runtime.clone(),
            renderer: runtime,
        }
    }
}

/// Files written for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutput {
    pub route: Route,
    pub html: PathBuf,
    pub sidecar: PathBuf,
    pub hydrated: bool,
}

/// Generate one route from `snapshot`.
pub fn generate(
    route: &Route,
    snapshot: &Snapshot,
    collab: &Collaborators,
) -> Result<UnitOutput, UnitError> {
    let entry = snapshot
        .routes
        .get(route)
        .ok_or_else(|| UnitError::UnknownRoute(route.clone()))?;
    Unit::new(entry, snapshot, collab).run()
}

struct Content {
    element: Element,
    meta: Map<String, Value>,
    props: Value,
    client: Option<PathBuf>,
}

struct Unit<'a> {
    entry: &'a RouteEntry,
    snapshot: &'a Snapshot,
    collab: &'a Collaborators,
    ctx: PropsContext,
}

impl<'a> Unit<'a> {
    fn new(entry: &'a RouteEntry, snapshot: &'a Snapshot, collab: &'a Collaborators) -> Self {
        let settings = &snapshot.settings;
        let ctx = PropsContext {
            route: entry.route.clone(),
            url: settings.absolute_url(&entry.route),
            api_base_url: settings.env.api_base_url.clone(),
        };
        Self {
            entry,
            snapshot,
            collab,
            ctx,
        }
    }

    fn settings(&self) -> &Settings {
        &self.snapshot.settings
    }

    fn run(self) -> Result<UnitOutput, UnitError> {
        let source = self.entry.source().ok_or_else(|| UnitError::Invalid {
            module: self.entry.rel.clone(),
            reason: "route has no content source".into(),
        })?;
        let renderer = source.renderer();
        let content = self.content(source)?;

        let mut layouts = Vec::with_capacity(self.entry.layouts.len());
        for layout in &self.entry.layouts {
            let descriptor = self.load(&layout.path, true)?;
            let props = self.props(&descriptor, &content.meta, renderer)?;
            layouts.push((layout.path.clone(), props));
        }
        let descriptors: Vec<LayoutDescriptor> = layouts
            .iter()
            .map(|(path, props)| LayoutDescriptor {
                module: self.url_of(path),
                props: props.clone(),
            })
            .collect();

        let settings = self.settings();
        let request = RenderRequest {
            element: compose(content.element, &layouts),
            meta: content.meta.clone(),
            layouts: descriptors.clone(),
            location: LocationInfo::new(
                self.ctx.url.clone(),
                self.entry.route.clone(),
                settings.env.base_url.clone(),
            ),
        };
        let rendered = self.collab.renderer.render(&request).map_err(UnitError::Render)?;

        let route = &self.entry.route;
        let html_path = settings.html_path(route);
        let sidecar_path = settings.sidecar_path(route);

        let (html, sidecar) = match &content.client {
            Some(client) => {
                let mut entries: Vec<&Path> = vec![client.as_path()];
                entries.extend(self.entry.layouts.iter().map(|l| l.path.as_path()));
                let head = self.hydrated_head(&rendered, &entries);

                let bootstrap = self
                    .snapshot
                    .hydrate_url
                    .as_deref()
                    .map(|url| {
                        let descriptor = settings.output_url(&sidecar_path).unwrap_or_default();
                        bootstrap_script(url, &descriptor)
                    })
                    .unwrap_or_default();

                let sidecar = Sidecar::Hydrate {
                    entry: self.url_of(client),
                    layouts: descriptors,
                    page: PageData {
                        meta: content.meta,
                        props: content.props,
                    },
                };
                (document(&head, &rendered.body, &bootstrap), sidecar)
            }
            None => {
                let head = assemble_head(&rendered.head, &rendered.styles, "", &[]);
                let html = document(&head, &rendered.body, "");
                (html, Sidecar::Static { head, body: rendered.body })
            }
        };

        let json = sidecar.to_json();
        write_atomic(&[
            (html_path.as_path(), html.as_bytes()),
            (sidecar_path.as_path(), json.as_bytes()),
        ])?;

        Ok(UnitOutput {
            route: route.clone(),
            html: html_path,
            sidecar: sidecar_path,
            hydrated: sidecar.is_hydrate(),
        })
    }

    fn content(&self, source: ContentSource<'_>) -> Result<Content, UnitError> {
        let renderer = source.renderer();
        match source {
            ContentSource::Page(module) | ContentSource::Static(module) => {
                let descriptor = self.load(module, true)?;
                let props = self.props(&descriptor, &descriptor.meta, renderer)?;
                Ok(Content {
                    element: component(module, &props),
                    meta: descriptor.meta,
                    props,
                    client: None,
                })
            }
            ContentSource::Hydrated { client, data } => {
                let view = self.load(client, true)?;
                let data = self.load(data, false)?;
                let mut meta = view.meta;
                meta.extend(data.meta.clone());
                let props = self.props(&data, &meta, renderer)?;
                Ok(Content {
                    element: component(client, &props),
                    meta,
                    props,
                    client: Some(client.to_path_buf()),
                })
            }
            ContentSource::Markdown(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| UnitError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let options = self.settings().config.build.markdown.to_pulldown_options();
                let doc = MarkdownDoc::parse(&text, options).map_err(|source| {
                    UnitError::FrontMatter {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                let injected = Injected {
                    url: &self.ctx.url,
                    meta: &doc.meta,
                    renderer,
                };
                let props = inject(path, Value::Object(Map::new()), injected)?;
                Ok(Content {
                    element: Element::Html { html: doc.html },
                    meta: doc.meta,
                    props,
                    client: None,
                })
            }
        }
    }

    fn load(&self, module: &Path, component: bool) -> Result<ModuleDescriptor, UnitError> {
        let shape = self
            .collab
            .host
            .describe(module)
            .map_err(|e| UnitError::host(module, e))?;
        match shape.validate(module, component) {
            Validated::Valid(descriptor) => Ok(descriptor),
            Validated::Invalid(reason) => Err(UnitError::Invalid {
                module: module.to_path_buf(),
                reason,
            }),
        }
    }

    fn props(
        &self,
        descriptor: &ModuleDescriptor,
        meta: &Map<String, Value>,
        renderer: &'static str,
    ) -> Result<Value, UnitError> {
        let raw = if descriptor.has_props {
            self.collab
                .host
                .call_props(&descriptor.module, &self.ctx)
                .map_err(|e| UnitError::host(&descriptor.module, e))?
        } else {
            Value::Object(Map::new())
        };
        let injected = Injected {
            url: &self.ctx.url,
            meta,
            renderer,
        };
        inject(&descriptor.module, raw, injected)
    }

    /// Browser URL of a module file.
    fn url_of(&self, path: &Path) -> String {
        let output = self.snapshot.externalized.output_of(path);
        self.settings()
            .output_url(&output)
            .unwrap_or_else(|| to_slash(&output))
    }

    fn hydrated_head(&self, rendered: &RenderOutput, entries: &[&Path]) -> String {
        let snapshot = self.snapshot;
        let mut roots: Vec<&Path> = entries.to_vec();
        roots.extend(snapshot.hydrate_script.as_deref());
        let closure = snapshot.graph.closure(roots);
        let import_map = ImportMap::build(
            &closure,
            &snapshot.graph,
            &snapshot.externalized,
            &snapshot.settings,
            &snapshot.packages,
        );
        let preloads = preload_urls(entries, &snapshot.graph, &snapshot.externalized, &snapshot.settings);
        assemble_head(&rendered.head, &rendered.styles, &import_map.to_script(), &preloads)
    }
}

fn component(module: &Path, props: &Value) -> Element {
    Element::Component {
        module: module.to_path_buf(),
        props: props.clone(),
        children: None,
    }
}

#[cfg(test)]
pub(crate) mod fake;
#[cfg(test)]
mod tests;
