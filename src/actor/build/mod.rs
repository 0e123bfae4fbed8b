//! Build actor: owns the current snapshot and schedules all watch-mode work.
//!
//! ```text
//!                    ┌── category lanes ──► Full | Refresh | Public ──┐
//! BuildMsg::Changed ─┤                                                ├─► spawn_blocking
//!                    └── (Refresh result) ──► route lanes ──► units ──┘
//! ```
//!
//! Scheduling rules:
//! - one category job at a time, global categories first
//! - a full build or refresh waits for running route units; route units
//!   wait while either runs
//! - the snapshot is replaced only here, from job results

mod lane;
mod refresh;
mod scope;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;

use super::messages::{BuildMsg, FileChange};
use crate::config::SettingsHandle;
use crate::core::{Route, WatchCategory};
use crate::logger::{status_error, status_success, status_warning};
use crate::pipeline::{Builder, Snapshot, UnitSummary, sync_public_file};
use crate::utils::plural_count;

pub use lane::KeyedLanes;
pub use refresh::{Refreshed, refresh};
pub use scope::{PendingPaths, Scope, next_due};

/// Result of a blocking job, sent back to the actor loop.
enum Done {
    Full {
        category: WatchCategory,
        /// Present once settings were re-derived, even if the build failed
        builder: Option<Arc<Builder>>,
        result: Result<Arc<Snapshot>>,
    },
    Refresh {
        category: WatchCategory,
        result: Result<Refreshed>,
    },
    Public {
        result: Result<usize>,
    },
    Route {
        route: Route,
        summary: UnitSummary,
    },
}

pub struct BuildActor {
    rx: mpsc::Receiver<BuildMsg>,
    handle: Arc<SettingsHandle>,
    builder: Arc<Builder>,
    snapshot: Option<Arc<Snapshot>>,
    categories: KeyedLanes<WatchCategory>,
    pending: PendingPaths,
    routes: KeyedLanes<Route>,
    /// Category job in flight
    active: Option<WatchCategory>,
    done_tx: mpsc::UnboundedSender<Done>,
    done_rx: mpsc::UnboundedReceiver<Done>,
}

impl BuildActor {
    pub fn new(rx: mpsc::Receiver<BuildMsg>, handle: Arc<SettingsHandle>) -> Self {
        let settings = handle.load();
        let builder = Arc::new(Builder::new(Arc::clone(&settings)));
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            rx,
            handle,
            builder,
            snapshot: None,
            categories: KeyedLanes::new(settings.config.watch.debounce()),
            pending: PendingPaths::default(),
            routes: KeyedLanes::new(settings.config.watch.route_debounce()),
            active: None,
            done_tx,
            done_rx,
        }
    }

    pub async fn run(mut self) {
        self.initial_build().await;

        loop {
            let now = Instant::now();
            self.dispatch(now);
            let wake = self.next_wake(now);

            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(BuildMsg::Changed(changes)) => self.on_changes(changes, Instant::now()),
                    Some(BuildMsg::Shutdown) | None => break,
                },
                Some(done) = self.done_rx.recv() => self.on_done(done, Instant::now()),
                _ = tokio::time::sleep_until(wake.into()) => {}
            }
        }

        // no mid-unit cancellation: let running jobs finish
        while self.in_flight() {
            match self.done_rx.recv().await {
                Some(done) => self.on_done(done, Instant::now()),
                None => break,
            }
        }
        crate::debug!("build"; "build actor stopped");
    }

    async fn initial_build(&mut self) {
        let builder = Arc::clone(&self.builder);
        let joined = tokio::task::spawn_blocking(move || builder.full_build()).await;
        match joined {
            Ok(Ok(snapshot)) => self.snapshot = Some(snapshot),
            Ok(Err(e)) => status_error("initial build failed", &format!("{e:#}")),
            Err(e) => status_error("initial build panicked", &e.to_string()),
        }
    }

    fn on_changes(&mut self, changes: Vec<FileChange>, now: Instant) {
        for change in &changes {
            self.pending.add(change);
            self.categories.event(change.category, now);
        }
    }

    fn in_flight(&self) -> bool {
        self.active.is_some() || self.routes.any_running()
    }

    /// Deadlines still in the past after `dispatch` belong to blocked lanes;
    /// the job that blocks them wakes the loop when it finishes.
    fn next_wake(&self, now: Instant) -> Instant {
        [
            self.categories.next_deadline_after(now),
            self.routes.next_deadline_after(now),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(now + Duration::from_secs(86400))
    }

    /// Start whatever is due and allowed to run.
    fn dispatch(&mut self, now: Instant) {
        if self.active.is_none()
            && let Some(category) = next_due(&self.categories.due(now))
        {
            self.start_category(category, now);
        }

        let blocked = self.active.is_some_and(|c| Scope::of(c).blocks_routes());
        if blocked {
            return;
        }
        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        for route in start_due_routes(&mut self.routes, &snapshot, now) {
            self.spawn_route(route, Arc::clone(&snapshot));
        }
    }

    fn start_category(&mut self, category: WatchCategory, now: Instant) {
        let scope = Scope::of(category);
        if scope.blocks_routes() && self.routes.any_running() {
            return;
        }

        let paths = self.pending.take(category);
        if paths.is_empty() && scope != Scope::Full {
            // already covered by a full rebuild
            if self.categories.start(&category, now) {
                self.categories.finish(&category, now);
            }
            return;
        }
        if !self.categories.start(&category, now) {
            return;
        }
        self.active = Some(category);
        crate::debug!("watch"; "{} changed: {}", category.name(), plural_count(paths.len(), "file"));

        match scope {
            Scope::Full => self.spawn_full(category),
            Scope::Refresh => self.spawn_refresh(category, paths),
            Scope::Public => self.spawn_public(paths),
        }
    }

    fn spawn_full(&mut self, category: WatchCategory) {
        self.pending.clear();
        let handle = Arc::clone(&self.handle);
        let previous = self.snapshot.clone();
        let tx = self.done_tx.clone();
        tokio::task::spawn_blocking(move || {
            let (builder, result) = full_rebuild(&handle, previous.as_deref());
            let _ = tx.send(Done::Full {
                category,
                builder,
                result,
            });
        });
    }

    fn spawn_refresh(&mut self, category: WatchCategory, paths: Vec<PathBuf>) {
        let builder = Arc::clone(&self.builder);
        let previous = self.snapshot.clone();
        let tx = self.done_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = refresh(&builder, previous.as_deref(), &paths);
            let _ = tx.send(Done::Refresh { category, result });
        });
    }

    fn spawn_public(&mut self, paths: Vec<PathBuf>) {
        let settings = Arc::clone(self.builder.settings());
        let tx = self.done_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = paths.iter().try_fold(0usize, |count, path| {
                let synced = sync_public_file(&settings, path)?;
                Ok::<_, anyhow::Error>(count + usize::from(synced.is_some()))
            });
            let _ = tx.send(Done::Public { result });
        });
    }

    fn spawn_route(&mut self, route: Route, snapshot: Arc<Snapshot>) {
        let builder = Arc::clone(&self.builder);
        let tx = self.done_tx.clone();
        tokio::task::spawn_blocking(move || {
            let summary = builder.generate(vec![route.clone()], &snapshot);
            let _ = tx.send(Done::Route { route, summary });
        });
    }

    fn on_done(&mut self, done: Done, now: Instant) {
        match done {
            Done::Full {
                category,
                builder,
                result,
            } => {
                self.finish_category(category, now);
                if let Some(builder) = builder {
                    self.builder = builder;
                }
                match result {
                    Ok(snapshot) => {
                        status_success(&format!(
                            "{} changed, rebuilt {}",
                            category.name(),
                            plural_count(snapshot.routes.len(), "route")
                        ));
                        self.snapshot = Some(snapshot);
                    }
                    Err(e) => status_error("rebuild failed", &format!("{e:#}")),
                }
            }
            Done::Refresh { category, result } => {
                self.finish_category(category, now);
                match result {
                    Ok(refreshed) => self.apply_refresh(refreshed, now),
                    Err(e) => status_error(&format!("{} update failed", category.name()), &format!("{e:#}")),
                }
            }
            Done::Public { result } => {
                self.finish_category(WatchCategory::Public, now);
                match result {
                    Ok(count) => status_success(&format!("synced {}", plural_count(count, "public file"))),
                    Err(e) => status_error("public sync failed", &format!("{e:#}")),
                }
            }
            Done::Route { route, summary } => {
                self.routes.finish(&route, now);
                match summary.failed.first() {
                    None if summary.generated.is_empty() => {}
                    None => status_success(&format!("regenerated {route}")),
                    Some((_, e)) => status_error(&format!("{route} failed"), &e.to_string()),
                }
            }
        }
    }

    fn finish_category(&mut self, category: WatchCategory, now: Instant) {
        self.categories.finish(&category, now);
        if self.active == Some(category) {
            self.active = None;
        }
    }

    fn apply_refresh(&mut self, refreshed: Refreshed, now: Instant) {
        let Refreshed {
            snapshot,
            regenerate,
            removed,
        } = refreshed;

        for route in &removed {
            status_warning(&format!("removed {route}"));
        }
        if regenerate.is_empty() && removed.is_empty() {
            crate::debug!("watch"; "no route affected");
        }
        for route in regenerate {
            self.routes.event(route, now);
        }
        self.snapshot = Some(snapshot);
    }
}

/// Start every due route lane whose route still exists in `snapshot`.
///
/// A refresh or full rebuild can remove a route after its event was queued;
/// such lanes are dropped instead of running into an unknown route.
fn start_due_routes(lanes: &mut KeyedLanes<Route>, snapshot: &Snapshot, now: Instant) -> Vec<Route> {
    let mut started = Vec::new();
    for route in lanes.due(now) {
        if snapshot.routes.get(&route).is_none() {
            crate::debug!("watch"; "dropped queued {}: route removed", route);
            lanes.forget(&route);
            continue;
        }
        if lanes.start(&route, now) {
            started.push(route);
        }
    }
    started
}

/// Re-derive settings, then rebuild everything with a fresh builder.
///
/// A settings file that fails to parse keeps the old builder.
fn full_rebuild(
    handle: &SettingsHandle,
    previous: Option<&Snapshot>,
) -> (Option<Arc<Builder>>, Result<Arc<Snapshot>>) {
    match handle.reload() {
        Ok(true) => crate::debug!("watch"; "settings reloaded"),
        Ok(false) => {}
        Err(e) => return (None, Err(e)),
    }
    let builder = Arc::new(Builder::new(handle.load()).quiet(true));
    let result = builder.full_build().and_then(|snapshot| {
        if let Some(previous) = previous {
            builder.remove_stale(previous, &snapshot)?;
        }
        Ok(snapshot)
    });
    (Some(builder), result)
}
