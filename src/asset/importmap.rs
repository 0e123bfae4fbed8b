//! Browser import maps.
//!
//! Bare specifiers used by local modules go in `imports`; specifiers used from
//! inside a vendored package go in `scopes` keyed by that package's URL, so two
//! versions of one package can be loaded by the same page.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::externalize::Externalized;
use super::package::PackageCache;
use crate::config::Settings;
use crate::core::is_script;
use crate::graph::{ModuleGraph, is_bare};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportMap {
    pub imports: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scopes: BTreeMap<String, BTreeMap<String, String>>,
}

impl ImportMap {
    /// Import map covering every module in `closure`.
    pub fn build(
        closure: &[PathBuf],
        graph: &ModuleGraph,
        externalized: &Externalized,
        settings: &Settings,
        cache: &PackageCache,
    ) -> Self {
        let mut map = Self::default();

        for path in closure {
            let Some(record) = graph.module(path) else {
                continue;
            };
            let scope = cache
                .package_of(path)
                .and_then(|info| externalized.package_dir(&info.root))
                .and_then(|dir| settings.output_url(dir))
                .map(|url| format!("{url}/"));

            for dep in record.dependencies.iter().filter(|d| is_bare(&d.specifier)) {
                let Some(url) = settings.output_url(&externalized.output_of(&dep.resolved)) else {
                    continue;
                };
                let table = match &scope {
                    Some(scope) => map.scopes.entry(scope.clone()).or_default(),
                    None => &mut map.imports,
                };
                table.entry(dep.specifier.clone()).or_insert(url);
            }
        }
        map
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.scopes.is_empty()
    }

    /// `<script type="importmap">…</script>`, or nothing when empty.
    pub fn to_script(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let json = serde_json::to_string(self).unwrap_or_default();
        // `</script>` inside a string would end the element early
        format!(
            r#"<script type="importmap">{}</script>"#,
            json.replace("</", "<\\/")
        )
    }
}

/// `modulepreload` URLs for the dependencies of `entries` (entries excluded),
/// sorted and unique.
pub fn preload_urls(
    entries: &[&Path],
    graph: &ModuleGraph,
    externalized: &Externalized,
    settings: &Settings,
) -> Vec<String> {
    let mut urls: Vec<String> = graph
        .closure(entries.iter().copied())
        .iter()
        .filter(|path| !entries.contains(&path.as_path()) && is_script(path))
        .filter_map(|path| settings.output_url(&externalized.output_of(path)))
        .collect();
    urls.sort();
    urls.dedup();
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::externalize;
    use crate::config::{PackageGraph, test_settings};
    use crate::graph::{ModuleResolver, collect};
    use crate::utils::path::normalize_path;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn package(root: &Path, dir: &str, name: &str, version: &str, body: &str) {
        write(
            root,
            &format!("{dir}/package.json"),
            &format!(r#"{{"name":"{name}","version":"{version}","main":"index.js"}}"#),
        );
        write(root, &format!("{dir}/index.js"), body);
    }

    #[test]
    fn test_imports_and_scopes() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let settings = test_settings(&root, "");

        package(&root, "node_modules/lib", "lib", "2.0.0", "export default 2;");
        package(&root, "node_modules/old", "old", "0.1.0", "import lib from 'lib';\nexport default lib;");
        package(&root, "node_modules/old/node_modules/lib", "lib", "1.0.0", "export default 1;");

        let compiled = settings.compiled_root();
        let client = write(
            &compiled,
            "index.client.js",
            "import lib from 'lib';\nimport old from 'old';\nimport './local.js';\nexport default () => lib + old;",
        );
        write(&compiled, "local.js", "export {};");

        let graph = collect(&[client.clone()], &ModuleResolver::new(), PackageGraph::Follow).unwrap();
        let cache = PackageCache::new();
        let ext = externalize(&graph, &[], &settings, &cache).unwrap();
        let closure = graph.closure([client.as_path()]);
        let map = ImportMap::build(&closure, &graph, &ext, &settings, &cache);

        assert_eq!(map.imports["lib"], "/_external/lib@2.0.0/index.js");
        assert_eq!(map.imports["old"], "/_external/old@0.1.0/index.js");
        assert!(!map.imports.contains_key("./local.js"));
        assert_eq!(
            map.scopes["/_external/old@0.1.0/"]["lib"],
            "/_external/lib@1.0.0/index.js"
        );

        let script = map.to_script();
        assert!(script.starts_with(r#"<script type="importmap">{"imports":"#));

        let preload = preload_urls(&[client.as_path()], &graph, &ext, &settings);
        assert_eq!(
            preload,
            vec![
                "/_external/lib@1.0.0/index.js",
                "/_external/lib@2.0.0/index.js",
                "/_external/old@0.1.0/index.js",
                "/src/local.js",
            ]
        );
    }

    #[test]
    fn test_empty_map_renders_nothing() {
        assert_eq!(ImportMap::default().to_script(), "");
    }
}
