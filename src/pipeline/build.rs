//! Full and incremental builds.
//!
//! Full build phases:
//! - **Clean** - one-shot builds start from an empty output root
//! - **Compile** - every compilable source file into a fresh compiled root in
//!   the work directory
//! - **Publish** - copy browser-facing compiled modules into the output
//! - **Public** - mirror the passthrough tree
//! - **Collect** - graph, route table, boundary check, externalization
//! - **Vendor** - copy packages and local support files, write the API manifest
//! - **Generate** - every route through the unit pool
//!
//! Structural errors abort before any unit runs. Unit errors are reported
//! per route; one-shot builds fail at the end if any route failed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;

use super::manifest::write_manifest;
use super::public::mirror_public;
use super::{BuildError, Snapshot};
use crate::asset::{PackageCache, copy_externalized};
use crate::compiler::{self, Compiler, is_compilable};
use crate::config::Settings;
use crate::core::{Route, is_shutdown};
use crate::generator::{Collaborators, UnitError};
use crate::logger::ProgressLine;
use crate::pool::UnitPool;
use crate::route::print_conflicts;
use crate::utils::plural_count;
use crate::utils::walk::collect_all_files;
use crate::{debug, log};

/// Results of one batch of route units.
#[derive(Debug, Default)]
pub struct UnitSummary {
    pub generated: Vec<Route>,
    pub failed: Vec<(Route, UnitError)>,
}

impl UnitSummary {
    pub fn total(&self) -> usize {
        self.generated.len() + self.failed.len()
    }

    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Everything a build needs besides the snapshot: settings, compiler, pool.
///
/// Rebuilt whenever the settings change, since both the compiler and the
/// runtime command come from them.
pub struct Builder {
    settings: Arc<Settings>,
    compiler: Box<dyn Compiler>,
    pool: UnitPool,
    packages: Arc<PackageCache>,
    quiet: bool,
}

impl Builder {
    pub fn new(settings: Arc<Settings>) -> Self {
        let compiler = compiler::from_settings(&settings);
        let collab = Collaborators::from_settings(&settings);
        Self::with_parts(settings, compiler, collab)
    }

    pub fn with_parts(
        settings: Arc<Settings>,
        compiler: Box<dyn Compiler>,
        collab: Collaborators,
    ) -> Self {
        let pool = UnitPool::new(settings.config.build.worker_count(), collab);
        Self {
            settings,
            compiler,
            pool,
            packages: Arc::new(PackageCache::new()),
            quiet: false,
        }
    }

    /// Suppress the progress line.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    /// Build the whole site from scratch.
    pub fn full_build(&self) -> Result<Arc<Snapshot>> {
        let settings = &self.settings;
        let strict = settings.mode.is_strict();

        if strict {
            reset_dir(settings.output_root())?;
        }
        self.packages.clear();

        self.compile_all()?;

        let public = mirror_public(settings).context("failed to mirror public files")?;
        debug!("build"; "public: {} written", public.written());

        let snapshot = self.prepare()?;
        let routes = snapshot.all_routes();
        let summary = self.generate(routes, &snapshot);

        if !self.quiet {
            log!(
                "build";
                "{}, {} to `{}`",
                plural_count(summary.generated.len(), "route"),
                plural_count(snapshot.routes.endpoints().len(), "endpoint"),
                settings.config.root_relative(settings.output_root()).display()
            );
        }
        if strict && !summary.is_ok() {
            return Err(BuildError::Units {
                failed: summary.failed.len(),
                total: summary.total(),
            }
            .into());
        }
        Ok(snapshot)
    }

    /// Compile every compilable file below the source root into an empty
    /// compiled root, so no output of a deleted source survives.
    pub fn compile_all(&self) -> Result<()> {
        reset_dir(&self.settings.compiled_root())?;
        let sources: Vec<PathBuf> = collect_all_files(self.settings.source_root())
            .into_iter()
            .filter(|p| is_compilable(p))
            .collect();
        self.compile(&sources)
    }

    /// Compile source files into the compiled root. Files that no longer
    /// exist have their compiled output removed.
    pub fn compile(&self, sources: &[PathBuf]) -> Result<()> {
        let settings = &self.settings;
        let src_root = settings.source_root();
        let out_root = settings.compiled_root();

        let (present, removed): (Vec<PathBuf>, Vec<PathBuf>) = sources
            .iter()
            .filter(|p| is_compilable(p))
            .cloned()
            .partition(|p| p.is_file());

        for source in &removed {
            let output = self.compiler.output_path(source, src_root, &out_root);
            if output.is_file() {
                fs::remove_file(&output)
                    .with_context(|| format!("failed to remove `{}`", output.display()))?;
            }
        }
        if present.is_empty() {
            return Ok(());
        }

        let report = self
            .compiler
            .compile(&present, src_root, &out_root)
            .with_context(|| format!("compiler `{}` could not run", self.compiler.name()))?;
        if report.success {
            for line in &report.diagnostics {
                debug!("compile"; "{}", line);
            }
            return Ok(());
        }

        if settings.mode.is_strict() {
            return Err(BuildError::Compile {
                compiler: self.compiler.name().to_string(),
                diagnostics: report.diagnostics,
            }
            .into());
        }
        log!("compile"; "`{}` reported errors", self.compiler.name());
        for line in &report.diagnostics {
            eprintln!("{line}");
        }
        Ok(())
    }

    /// Compiled output paths of changed sources; markdown stays in place.
    pub fn compiled_paths(&self, sources: &[PathBuf]) -> Vec<PathBuf> {
        let src_root = self.settings.source_root();
        let out_root = self.settings.compiled_root();
        sources
            .iter()
            .map(|p| {
                if is_compilable(p) {
                    self.compiler.output_path(p, src_root, &out_root)
                } else {
                    p.clone()
                }
            })
            .collect()
    }

    /// Collect a fresh snapshot, enforce structural rules, vendor packages
    /// and write the API manifest.
    pub fn prepare(&self) -> Result<Arc<Snapshot>> {
        let snapshot = self.collect()?;
        enforce(&snapshot)?;

        let minify = self.settings.config.build.minify;
        let stats = copy_externalized(&snapshot.externalized, minify)
            .context("failed to copy externalized modules")?;
        debug!(
            "vendor";
            "{} ({} written, {} fresh)",
            plural_count(snapshot.externalized.versions.len(), "package"),
            stats.written(),
            stats.fresh
        );
        for (name, versions) in snapshot.externalized.versions.duplicated() {
            debug!("vendor"; "{} at {}", name, versions.join(", "));
        }

        if let Some(path) = write_manifest(&snapshot)? {
            debug!("api"; "manifest: {}", path.display());
        }
        Ok(Arc::new(snapshot))
    }

    /// Collect the compiled tree without writing anything.
    pub fn collect(&self) -> Result<Snapshot, BuildError> {
        Snapshot::collect(Arc::clone(&self.settings), Arc::clone(&self.packages))
    }

    /// Run route units and report failures.
    pub fn generate(&self, routes: Vec<Route>, snapshot: &Arc<Snapshot>) -> UnitSummary {
        let mut summary = UnitSummary::default();
        if routes.is_empty() || is_shutdown() {
            return summary;
        }

        let show_progress = !self.quiet && self.settings.mode.is_strict();
        let progress = show_progress.then(|| ProgressLine::new("routes", routes.len()));
        let results = self.pool.run(routes, snapshot, progress.as_ref());
        if let Some(progress) = progress {
            progress.finish();
        }

        for (route, result) in results {
            match result {
                Ok(_) => summary.generated.push(route),
                Err(e) => {
                    log!("error"; "{}: {}", route, e);
                    summary.failed.push((route, e));
                }
            }
        }
        summary.generated.sort();
        summary.failed.sort_by(|a, b| a.0.cmp(&b.0));
        summary
    }

    /// Remove outputs of routes present in `previous` but not in `next`, and
    /// published modules the browser no longer loads.
    pub fn remove_stale(&self, previous: &Snapshot, next: &Snapshot) -> Result<Vec<Route>> {
        let published: FxHashSet<&Path> = next
            .externalized
            .published
            .iter()
            .map(|job| job.to.as_path())
            .collect();
        for job in &previous.externalized.published {
            if !published.contains(job.to.as_path()) && job.to.is_file() {
                fs::remove_file(&job.to)
                    .with_context(|| format!("failed to remove `{}`", job.to.display()))?;
            }
        }

        let stale: Vec<Route> = previous
            .routes
            .routes()
            .filter(|r| next.routes.get(r).is_none())
            .cloned()
            .collect();
        for route in &stale {
            remove_route_output(&self.settings, route)?;
        }
        Ok(stale)
    }
}

/// Conflicts and boundary violations: fatal in one-shot mode, warnings in
/// watch mode.
fn enforce(snapshot: &Snapshot) -> Result<(), BuildError> {
    let strict = snapshot.settings.mode.is_strict();

    if let Err(conflicts) = snapshot.routes.check() {
        if strict {
            return Err(conflicts.into());
        }
        print_conflicts(&conflicts.0);
    }

    if !snapshot.violations.is_empty() {
        if strict {
            return Err(BuildError::Boundary(snapshot.violations.clone()));
        }
        for violation in &snapshot.violations {
            log!("boundary"; "{}", violation);
        }
    }
    Ok(())
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("failed to clean `{}`", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create `{}`", dir.display()))
}

/// Delete a route's HTML and sidecar, then its directory if left empty.
pub fn remove_route_output(settings: &Settings, route: &Route) -> Result<()> {
    for path in [settings.html_path(route), settings.sidecar_path(route)] {
        if path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove `{}`", path.display()))?;
        }
    }
    if !route.is_root()
        && let Some(dir) = settings.html_path(route).parent()
    {
        // only succeeds when empty
        fs::remove_dir(dir).ok();
    }
    Ok(())
}
