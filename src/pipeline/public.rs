//! Public passthrough tree, mirrored verbatim into the output root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::asset::{CopyOutcome, CopyStats, Refresh, copy_dir, copy_file};
use crate::config::Settings;

/// Mirror the whole public tree.
pub fn mirror_public(settings: &Settings) -> Result<CopyStats> {
    copy_dir(settings.public_root(), settings.output_root(), false)
}

/// Output path of a public file, if it lies inside the public root.
pub fn public_output(settings: &Settings, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(settings.public_root()).ok()?;
    Some(settings.output_root().join(rel))
}

/// Mirror one changed public file: copy it, or remove its output when the
/// source is gone. A reported file is always copied, whatever its mtime.
pub fn sync_public_file(settings: &Settings, path: &Path) -> Result<Option<CopyOutcome>> {
    let Some(output) = public_output(settings, path) else {
        return Ok(None);
    };
    if path.is_file() {
        return copy_file(path, &output, false, Refresh::Always).map(Some);
    }
    if output.is_file() {
        fs::remove_file(&output)
            .with_context(|| format!("failed to remove `{}`", output.display()))?;
    }
    Ok(None)
}
