//! Recursive file listing.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

const IGNORED_FILES: &[&str] = &[".DS_Store"];
const IGNORED_DIRS: &[&str] = &["node_modules", ".git"];

/// Collect all files below `dir`, skipping package-manager and VCS trees.
///
/// Results are sorted so that every caller sees a stable order.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .process_read_dir(|_, _, _, children| {
            children.retain(|entry| {
                entry.as_ref().map_or(true, |e| {
                    let name = e.file_name.to_str().unwrap_or_default();
                    !(e.file_type.is_dir() && IGNORED_DIRS.contains(&name))
                })
            });
        })
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path())
        .collect();

    files.sort();
    files
}
