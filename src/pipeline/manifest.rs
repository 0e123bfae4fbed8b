//! API endpoint manifest (`<output>/_api.json`).
//!
//! ```json
//! [{"method":"GET","path":"/about/getAboutData",
//!   "url":"http://localhost:3000/api/about/getAboutData",
//!   "module":".trellis/src/about/index.api.js","export":"getAboutData"}]
//! ```
//!
//! `module` is the compiled module relative to the project root. API modules
//! are server-only and never published, so it is not a browser URL.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use super::Snapshot;
use crate::route::{ApiEndpoint, HttpMethod};
use crate::utils::path::to_slash;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub method: HttpMethod,
    pub path: String,
    pub url: String,
    pub module: String,
    pub export: String,
}

/// Manifest rows in endpoint table order.
pub fn manifest_entries(snapshot: &Snapshot) -> Vec<ManifestEntry> {
    let settings = &snapshot.settings;
    snapshot
        .routes
        .endpoints()
        .iter()
        .map(|endpoint: &ApiEndpoint| ManifestEntry {
            method: endpoint.method,
            path: endpoint.path.clone(),
            url: settings.api_url(&endpoint.path),
            module: to_slash(&settings.config.root_relative(&endpoint.module)),
            export: endpoint.export.clone(),
        })
        .collect()
}

/// Write the manifest, or remove a stale one when the site has no endpoints.
///
/// Returns the manifest path when one was written.
pub fn write_manifest(snapshot: &Snapshot) -> Result<Option<PathBuf>> {
    let settings = &snapshot.settings;
    let path = settings
        .output_root()
        .join(&settings.config.build.api_manifest);

    let entries = manifest_entries(snapshot);
    if entries.is_empty() {
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove `{}`", path.display()))?;
        }
        return Ok(None);
    }

    let json = serde_json::to_string_pretty(&entries)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, json).with_context(|| format!("failed to write `{}`", path.display()))?;
    Ok(Some(path))
}
