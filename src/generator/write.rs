//! Publish a route's HTML and sidecar together.
//!
//! Phase 1 writes both files to temporaries next to their targets; phase 2
//! renames them into place in reverse order, so the HTML (listed first) is
//! committed last. A failure in phase 1 leaves the previous pair untouched. A
//! failure in phase 2 can leave a new sidecar next to the previous HTML, but a
//! reader that sees the new HTML always sees its sidecar. No file is ever
//! half-written.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::UnitError;
use crate::log;

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

fn remove_temp(temp: &Path) {
    if temp.exists()
        && let Err(e) = fs::remove_file(temp)
    {
        log!("warning"; "failed to remove `{}`: {}", temp.display(), e);
    }
}

fn cleanup(temps: &[(PathBuf, &Path)]) {
    for (temp, _) in temps {
        remove_temp(temp);
    }
}

/// Write every `(target, content)` pair, committing the first one last.
pub fn write_atomic(files: &[(&Path, &[u8])]) -> Result<(), UnitError> {
    let mut temps: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());

    for &(target, content) in files {
        if let Some(parent) = target.parent()
            && let Err(source) = fs::create_dir_all(parent)
        {
            cleanup(&temps);
            return Err(UnitError::Write {
                path: parent.to_path_buf(),
                source,
            });
        }
        let temp = temp_path(target);
        if let Err(source) = fs::write(&temp, content) {
            cleanup(&temps);
            remove_temp(&temp);
            return Err(UnitError::Write { path: temp, source });
        }
        temps.push((temp, target));
    }

    for (temp, target) in temps.iter().rev() {
        if let Err(source) = fs::rename(temp, target) {
            cleanup(&temps);
            return Err(UnitError::Write {
                path: target.to_path_buf(),
                source,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_pair() {
        let dir = TempDir::new().unwrap();
        let html = dir.path().join("about/index.html");
        let json = dir.path().join("about/page.json");
        write_atomic(&[(html.as_path(), b"<html>".as_slice()), (json.as_path(), b"{}".as_slice())]).unwrap();

        assert_eq!(fs::read_to_string(&html).unwrap(), "<html>");
        assert_eq!(fs::read_to_string(&json).unwrap(), "{}");
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("about"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_failure_keeps_previous_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let html = dir.path().join("index.html");
        fs::write(&html, "old").unwrap();
        // parent of the sidecar is a file: phase 1 fails after the html temp exists
        fs::write(dir.path().join("blocker"), "").unwrap();
        let json = dir.path().join("blocker/page.json");

        let err = write_atomic(&[(html.as_path(), b"new".as_slice()), (json.as_path(), b"{}".as_slice())]).unwrap_err();
        assert!(matches!(err, UnitError::Write { .. }));
        assert_eq!(fs::read_to_string(&html).unwrap(), "old");
        assert!(!temp_path(&html).exists());
    }

    #[test]
    fn test_html_is_committed_last() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("page.json");
        fs::write(&json, "old").unwrap();
        // a non-empty directory where the html goes: its rename fails
        let html = dir.path().join("index.html");
        fs::create_dir_all(html.join("x")).unwrap();

        let err = write_atomic(&[(html.as_path(), b"new".as_slice()), (json.as_path(), b"{}".as_slice())]).unwrap_err();
        assert!(matches!(err, UnitError::Write { ref path, .. } if path == &html));
        assert_eq!(fs::read_to_string(&json).unwrap(), "{}");
        assert!(html.is_dir());
        assert!(!temp_path(&html).exists());
        assert!(!temp_path(&json).exists());
    }
}
