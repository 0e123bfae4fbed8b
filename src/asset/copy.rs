//! Copy vendored packages, published modules and local support files into
//! the output tree.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use rayon::prelude::*;

use super::externalize::{CopyJob, Externalized};
use super::minify::{AssetKind, minify};
use crate::debug;
use crate::utils::walk::collect_all_files;

/// When an existing output counts as up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Output at least as new as the source. Used for bulk mirrors of trees
    /// nobody reported as changed (packages, the public tree).
    Mtime,
    /// Output already holds the source bytes.
    Content,
    /// Always write: the caller knows the source changed, whatever its mtime.
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Minified,
    /// Output already up to date; nothing written.
    Fresh,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub copied: usize,
    pub minified: usize,
    pub fresh: usize,
}

impl CopyStats {
    fn record(&mut self, outcome: CopyOutcome) {
        match outcome {
            CopyOutcome::Copied => self.copied += 1,
            CopyOutcome::Minified => self.minified += 1,
            CopyOutcome::Fresh => self.fresh += 1,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.copied += other.copied;
        self.minified += other.minified;
        self.fresh += other.fresh;
        self
    }

    /// Files actually written.
    pub fn written(&self) -> usize {
        self.copied + self.minified
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

fn is_fresh(from: &Path, to: &Path, refresh: Refresh) -> bool {
    match refresh {
        Refresh::Always => false,
        Refresh::Mtime => match (mtime(from), mtime(to)) {
            (Some(src), Some(dst)) => dst >= src,
            _ => false,
        },
        Refresh::Content => match (fs::read(from), fs::read(to)) {
            (Ok(src), Ok(dst)) => src == dst,
            _ => false,
        },
    }
}

/// Copy one file, minifying scripts and stylesheets when asked.
pub fn copy_file(from: &Path, to: &Path, minify_output: bool, refresh: Refresh) -> Result<CopyOutcome> {
    if is_fresh(from, to, refresh) {
        return Ok(CopyOutcome::Fresh);
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create `{}`", parent.display()))?;
    }

    if minify_output && let Some(kind) = AssetKind::of(from) {
        let source = fs::read_to_string(from)
            .with_context(|| format!("failed to read `{}`", from.display()))?;
        match minify(kind, from, &source) {
            Ok(code) => {
                fs::write(to, code).with_context(|| format!("failed to write `{}`", to.display()))?;
                return Ok(CopyOutcome::Minified);
            }
            Err(reason) => debug!("minify"; "kept verbatim: {}: {}", from.display(), reason),
        }
    }

    fs::copy(from, to)
        .with_context(|| format!("failed to copy `{}` to `{}`", from.display(), to.display()))?;
    Ok(CopyOutcome::Copied)
}

/// Mirror a directory (nested `node_modules` excluded) in parallel.
pub fn copy_dir(from: &Path, to: &Path, minify_output: bool) -> Result<CopyStats> {
    collect_all_files(from)
        .par_iter()
        .map(|file| {
            let rel = file.strip_prefix(from).unwrap_or(file);
            copy_file(file, &to.join(rel), minify_output, Refresh::Mtime)
        })
        .try_fold(CopyStats::default, |mut stats, outcome| {
            stats.record(outcome?);
            Ok(stats)
        })
        .try_reduce(CopyStats::default, |a, b| Ok(a.merge(b)))
}

/// Copy every package, published module and local file assigned by the
/// externalizer. Only packages are minified.
pub fn copy_externalized(ext: &Externalized, minify_output: bool) -> Result<CopyStats> {
    let packages = ext
        .packages
        .par_iter()
        .map(|CopyJob { from, to }| copy_dir(from, to, minify_output))
        .try_reduce(CopyStats::default, |a, b| Ok(a.merge(b)))?;

    let mut stats = packages;
    for CopyJob { from, to } in ext.published.iter().chain(&ext.local) {
        stats.record(copy_file(from, to, false, Refresh::Content)?);
    }
    Ok(stats)
}
