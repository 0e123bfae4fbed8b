use super::fake::{FakeHost, FakeRenderer};
use super::*;
use crate::asset::PackageCache;
use crate::config::test_settings;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

struct Site {
    _dir: TempDir,
    settings: Arc<Settings>,
}

impl Site {
    fn new(extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let settings = Arc::new(test_settings(dir.path(), extra));
        Self {
            _dir: dir,
            settings,
        }
    }

    /// Write a compiled module below the compiled root.
    fn module(&self, rel: &str, content: &str) -> &Self {
        write(&self.settings.compiled_root().join(rel), content);
        self
    }

    /// Write a file below the source root.
    fn source(&self, rel: &str, content: &str) -> &Self {
        write(&self.settings.source_root().join(rel), content);
        self
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::collect(Arc::clone(&self.settings), Arc::new(PackageCache::new())).unwrap()
    }

    fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn collab() -> Collaborators {
    Collaborators {
        host: Arc::new(FakeHost),
        renderer: Arc::new(FakeRenderer),
    }
}

fn sidecar_json(site: &Site, output: &UnitOutput) -> Value {
    serde_json::from_str(&site.read(&output.sidecar)).unwrap()
}

#[test]
fn test_page_without_layouts() {
    let site = Site::new("");
    site.module(
        "index.page.js",
        "// meta: {\"title\": \"Home\"}\nexport default function Home() {}\n",
    );
    let snapshot = site.snapshot();

    let output = generate(&Route::root(), &snapshot, &collab()).unwrap();
    assert_eq!(output.html, site.settings.output_root().join("index.html"));
    assert!(!output.hydrated);

    let html = site.read(&output.html);
    assert!(html.starts_with("<!doctype html><html><head><title>Home</title></head>"));
    assert!(html.contains(r#"<div id="root"><div data-module="index.page.js"></div></div>"#));
    assert!(!html.contains("data-descriptor"));
    assert!(!html.contains("importmap"));

    let sidecar = sidecar_json(&site, &output);
    assert_eq!(sidecar["kind"], "static");
    assert_eq!(sidecar["head"], "<title>Home</title>");
    assert!(sidecar.get("entry").is_none());
}

#[test]
fn test_hydrated_pair_under_layout() {
    let site = Site::new("");
    site.module(
        "about/index.client.js",
        "import { Widget } from './widget.js';\nexport default function About() { return Widget; }\n",
    )
    .module("about/widget.js", "export const Widget = 1;\n")
    .module(
        "about/index.static.js",
        "// props: {\"items\": [1, 2]}\n// meta: {\"title\": \"About\"}\nexport function props() {}\n",
    )
    .module(
        "about/index.layout.js",
        "// props: {\"nav\": \"main\"}\nexport default function Layout() {}\n",
    );
    let snapshot = site.snapshot();

    let output = generate(&Route::new("/about"), &snapshot, &collab()).unwrap();
    assert!(output.hydrated);

    let sidecar = sidecar_json(&site, &output);
    assert_eq!(sidecar["kind"], "hydrate");
    assert_eq!(sidecar["entry"], "/src/about/index.client.js");

    let layouts = sidecar["layouts"].as_array().unwrap();
    assert_eq!(layouts.len(), 1);
    assert_eq!(layouts[0]["module"], "/src/about/index.layout.js");
    assert_eq!(layouts[0]["props"]["nav"], "main");
    assert_eq!(layouts[0]["props"]["renderer"], "hydrate");

    let page = &sidecar["page"];
    assert_eq!(page["props"]["items"], json!([1, 2]));
    assert_eq!(page["props"]["url"], "http://localhost:3000/about/");
    assert_eq!(page["meta"]["title"], "About");

    let html = site.read(&output.html);
    assert!(html.contains(
        r#"<div data-module="index.layout.js"><div data-module="index.client.js"></div></div>"#
    ));
    assert!(html.contains(r#"<link rel="modulepreload" href="/src/about/widget.js">"#));
    assert!(!html.contains(r#"href="/src/about/index.client.js""#));
}

#[test]
fn test_bootstrap_script_points_at_sidecar() {
    let site = Site::new("[build]\nhydrate_script = \"runtime/hydrate.js\"\n");
    write(
        &site.settings.root().join("runtime/hydrate.js"),
        "export function hydrate() {}\n",
    );
    site.module("index.client.js", "export default function App() {}\n")
        .module("index.static.js", "export const data = 1;\n");
    let snapshot = site.snapshot();
    assert_eq!(snapshot.hydrate_url.as_deref(), Some("/runtime/hydrate.js"));

    let output = generate(&Route::root(), &snapshot, &collab()).unwrap();
    let html = site.read(&output.html);
    assert!(html.ends_with(
        r#"<script type="module" src="/runtime/hydrate.js" data-descriptor="/page.json"></script></body></html>"#
    ));
}

#[test]
fn test_non_object_props_names_module() {
    let site = Site::new("");
    site.module("index.page.js", "// props: [1, 2]\nexport default function Home() {}\n");
    let snapshot = site.snapshot();

    let err = generate(&Route::root(), &snapshot, &collab()).unwrap_err();
    let UnitError::NotObject { module, found } = &err else {
        panic!("expected NotObject, got {err:?}");
    };
    assert!(module.ends_with("index.page.js"));
    assert_eq!(*found, "an array");
    assert!(!site.settings.html_path(&Route::root()).exists());
}

#[test]
fn test_missing_default_export() {
    let site = Site::new("");
    site.module("index.page.js", "export const x = 1;\n");
    let snapshot = site.snapshot();

    let err = generate(&Route::root(), &snapshot, &collab()).unwrap_err();
    assert!(matches!(err, UnitError::Invalid { ref reason, .. } if reason.contains("default export")));
}

#[test]
fn test_throwing_props_is_host_error() {
    let site = Site::new("");
    site.module("index.page.js", "// props: throw\nexport default function Home() {}\n");
    let snapshot = site.snapshot();

    let err = generate(&Route::root(), &snapshot, &collab()).unwrap_err();
    assert!(matches!(err, UnitError::Host { source: HostError::Thrown(_), .. }));
    assert!(err.to_string().contains("index.page.js"));
}

#[test]
fn test_markdown_route() {
    let site = Site::new("");
    site.source("blog/post.md", "---\ntitle: Post\n---\n# Hello\n");
    let snapshot = site.snapshot();

    let output = generate(&Route::new("/blog/post"), &snapshot, &collab()).unwrap();
    let html = site.read(&output.html);
    assert!(html.contains("<title>Post</title>"));
    assert!(html.contains("<h1>Hello</h1>"));

    let sidecar = sidecar_json(&site, &output);
    assert_eq!(sidecar["kind"], "static");
}

#[test]
fn test_unknown_route() {
    let site = Site::new("");
    let snapshot = site.snapshot();
    let err = generate(&Route::new("/nope"), &snapshot, &collab()).unwrap_err();
    assert!(matches!(err, UnitError::UnknownRoute(_)));
}
