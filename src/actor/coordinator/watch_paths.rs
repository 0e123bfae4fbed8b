use std::path::{Path, PathBuf};

use crate::config::Settings;

/// Roots and single files the watcher attaches to.
///
/// Missing roots are kept: the watcher attaches them once they appear.
pub(super) fn collect_watch_paths(settings: &Settings) -> Vec<PathBuf> {
    let config = &settings.config;
    let mut paths = vec![
        settings.source_root().to_path_buf(),
        settings.public_root().to_path_buf(),
        config.config_path.clone(),
        config.build.env_file.clone(),
        config.build.compiler.config.clone(),
    ];
    paths.extend(config.build.hydrate_script.iter().cloned());
    paths.retain(|p| !p.as_os_str().is_empty());

    drop_covered(&mut paths, settings.output_root());
    paths
}

/// Drop duplicates, anything under the output root, and paths already
/// covered by a recursive parent root.
fn drop_covered(paths: &mut Vec<PathBuf>, output_root: &Path) {
    paths.retain(|path| !path.starts_with(output_root));
    paths.sort();
    paths.dedup();

    let snapshot = paths.clone();
    paths.retain(|path| {
        !snapshot
            .iter()
            .any(|other| other != path && other.is_dir() && path.starts_with(other))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn drops_output_children_and_nested_roots() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/public")).unwrap();
        let output = root.join("dist");

        let mut paths = vec![
            root.join("src"),
            root.join("src/public"),
            output.join("assets"),
            root.join("trellis.toml"),
            root.join("trellis.toml"),
        ];
        drop_covered(&mut paths, &output);

        assert_eq!(paths, vec![root.join("src"), root.join("trellis.toml")]);
    }

    #[test]
    fn collects_inputs_but_not_output() {
        let dir = TempDir::new().unwrap();
        let mut settings = test_settings(dir.path(), "[build]\nhydrate_script = \"runtime/hydrate.js\"\n");
        settings.config.config_path = settings.root().join("trellis.toml");

        let paths = collect_watch_paths(&settings);
        let root = settings.root();
        for expected in [
            root.join("src"),
            root.join("public"),
            root.join("trellis.toml"),
            root.join(".env"),
            root.join("tsconfig.json"),
            root.join("runtime/hydrate.js"),
        ] {
            assert!(paths.contains(&expected), "missing {}", expected.display());
        }
        assert!(!paths.iter().any(|p| p.starts_with(settings.output_root())));
    }
}
