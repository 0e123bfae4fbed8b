use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use super::{KeyedLanes, refresh, start_due_routes};
use crate::compiler::CopyCompiler;
use crate::config::{EnvVars, Settings, test_parse_config};
use crate::core::{BuildMode, Route};
use crate::generator::Collaborators;
use crate::generator::fake::{FakeHost, FakeRenderer};
use crate::pipeline::Builder;

const PAGE: &str = "export default function Page() {}\n";

fn builder(root: &Path) -> Builder {
    let config = test_parse_config("[build]\nworkers = 2\n").with_root(root);
    let settings = Settings::with_env(config, BuildMode::WATCH, &EnvVars::default()).unwrap();
    let collab = Collaborators {
        host: Arc::new(FakeHost),
        renderer: Arc::new(FakeRenderer),
    };
    Builder::with_parts(Arc::new(settings), Box::new(CopyCompiler), collab).quiet(true)
}

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn routes(list: &[&str]) -> Vec<Route> {
    list.iter().map(|r| Route::new(r)).collect()
}

#[test]
fn test_shared_module_change_regenerates_importers() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/blog/index.page.js",
        "import { x } from '../lib/format.js';\nexport default function Blog() { return x; }\n",
    );
    write(dir.path(), "src/index.page.js", PAGE);
    let lib = write(dir.path(), "src/lib/format.js", "export const x = 1;\n");

    let builder = builder(dir.path());
    let before = builder.full_build().unwrap();

    fs::write(&lib, "export const x = 2;\n").unwrap();
    let refreshed = refresh(&builder, Some(&before), &[lib]).unwrap();

    let regenerate: Vec<Route> = refreshed.regenerate.into_iter().collect();
    assert_eq!(regenerate, routes(&["/blog"]));
    assert!(refreshed.removed.is_empty());
    assert!(
        fs::read_to_string(dir.path().join(".trellis/src/lib/format.js"))
            .unwrap()
            .contains("x = 2")
    );
}

#[test]
fn test_new_layout_regenerates_routes_below_it() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/index.page.js", PAGE);
    write(dir.path(), "src/docs/intro.page.js", PAGE);
    write(dir.path(), "src/docs/setup.page.js", PAGE);

    let builder = builder(dir.path());
    let before = builder.full_build().unwrap();

    let layout = write(dir.path(), "src/docs/index.layout.js", PAGE);
    let refreshed = refresh(&builder, Some(&before), &[layout]).unwrap();

    let regenerate: Vec<Route> = refreshed.regenerate.into_iter().collect();
    assert_eq!(regenerate, routes(&["/docs/intro", "/docs/setup"]));
}

#[test]
fn test_markdown_edit_regenerates_its_route() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/index.page.js", PAGE);
    let post = write(dir.path(), "src/posts/hello.md", "# Hello\n");

    let builder = builder(dir.path());
    let before = builder.full_build().unwrap();

    fs::write(&post, "# Hello again\n").unwrap();
    let refreshed = refresh(&builder, Some(&before), &[post]).unwrap();

    let regenerate: Vec<Route> = refreshed.regenerate.into_iter().collect();
    assert_eq!(regenerate, routes(&["/posts/hello"]));
}

#[test]
fn test_new_and_deleted_routes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/index.page.js", PAGE);
    let old = write(dir.path(), "src/old.page.js", PAGE);

    let builder = builder(dir.path());
    let before = builder.full_build().unwrap();
    assert!(dir.path().join("dist/old/index.html").is_file());

    fs::remove_file(&old).unwrap();
    let fresh = write(dir.path(), "src/fresh.page.js", PAGE);
    let refreshed = refresh(&builder, Some(&before), &[old, fresh]).unwrap();

    let regenerate: Vec<Route> = refreshed.regenerate.into_iter().collect();
    assert_eq!(regenerate, routes(&["/fresh"]));
    assert_eq!(refreshed.removed, routes(&["/old"]));
    assert!(!dir.path().join("dist/old/index.html").exists());
    assert!(refreshed.snapshot.routes.get(&Route::new("/fresh")).is_some());
}

#[test]
fn test_refresh_without_snapshot_regenerates_everything() {
    let dir = TempDir::new().unwrap();
    let index = write(dir.path(), "src/index.page.js", PAGE);
    write(dir.path(), "src/about.page.js", PAGE);

    let builder = builder(dir.path());
    builder.compile(&[dir.path().join("src/about.page.js")]).unwrap();
    let refreshed = refresh(&builder, None, &[index]).unwrap();

    let regenerate: Vec<Route> = refreshed.regenerate.into_iter().collect();
    assert_eq!(regenerate, routes(&["/", "/about"]));
}

#[test]
fn test_queued_event_for_removed_route_is_dropped() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/index.page.js", PAGE);
    let old = write(dir.path(), "src/old.page.js", PAGE);

    let builder = builder(dir.path());
    let before = builder.full_build().unwrap();

    let t0 = Instant::now();
    let mut lanes = KeyedLanes::new(Duration::from_millis(50));
    lanes.event(Route::new("/old"), t0);
    lanes.event(Route::root(), t0);

    fs::remove_file(&old).unwrap();
    let refreshed = refresh(&builder, Some(&before), &[old]).unwrap();

    let later = t0 + Duration::from_millis(100);
    let started = start_due_routes(&mut lanes, &refreshed.snapshot, later);
    assert_eq!(started, vec![Route::root()]);
    assert!(lanes.due(later).is_empty());
    lanes.finish(&Route::root(), later);
    assert!(lanes.is_empty());
}

#[test]
fn test_module_no_longer_loaded_is_unpublished() {
    let dir = TempDir::new().unwrap();
    let client = write(
        dir.path(),
        "src/index.client.js",
        "import { chart } from './chart.js';\nexport default function App() { return chart; }\n",
    );
    write(dir.path(), "src/index.static.js", "export function props() {}\n");
    write(dir.path(), "src/chart.js", "export const chart = 1;\n");

    let builder = builder(dir.path());
    let before = builder.full_build().unwrap();
    let published = dir.path().join("dist/src/chart.js");
    assert!(published.is_file());

    fs::write(&client, "export default function App() { return 0; }\n").unwrap();
    refresh(&builder, Some(&before), &[client]).unwrap();

    assert!(!published.exists());
    assert!(dir.path().join("dist/src/index.client.js").is_file());
    // still compiled, just not served
    assert!(dir.path().join(".trellis/src/chart.js").is_file());
}
