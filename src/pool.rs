//! Bounded pool of route-unit workers.
//!
//! Each job is one route plus an immutable `Snapshot`. A worker runs the
//! generator inside `catch_unwind`, so a panicking unit becomes a
//! `UnitError::Panic` for that route while the worker keeps serving jobs.
//! Results travel back over a per-run reply channel; workers never touch
//! shared build state.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Receiver, Sender};

use crate::core::Route;
use crate::debug;
use crate::generator::{Collaborators, UnitError, UnitOutput, generate};
use crate::logger::ProgressLine;
use crate::pipeline::Snapshot;

pub type UnitResult = (Route, Result<UnitOutput, UnitError>);

struct Job {
    route: Route,
    snapshot: Arc<Snapshot>,
    reply: Sender<UnitResult>,
}

pub struct UnitPool {
    collab: Arc<Collaborators>,
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl UnitPool {
    /// Spawn `size` workers (at least one).
    pub fn new(size: usize, collab: Collaborators) -> Self {
        let (tx, rx) = channel::unbounded::<Job>();
        let collab = Arc::new(collab);
        let workers = (0..size.max(1))
            .map(|_| {
                let rx = rx.clone();
                let collab = Arc::clone(&collab);
                std::thread::spawn(move || run_worker(&rx, &collab))
            })
            .collect();
        Self {
            collab,
            jobs: Some(tx),
            workers,
        }
    }

    /// Generate `routes` and wait for every result, in completion order.
    ///
    /// Each run starts with a module host reload, so units see the modules
    /// compiled for `snapshot`.
    pub fn run(
        &self,
        routes: Vec<Route>,
        snapshot: &Arc<Snapshot>,
        progress: Option<&ProgressLine>,
    ) -> Vec<UnitResult> {
        let Some(jobs) = &self.jobs else {
            return Vec::new();
        };
        self.collab.host.reload();
        let (reply, results) = channel::bounded(routes.len());
        let mut submitted = 0;
        for route in routes {
            let job = Job {
                route,
                snapshot: Arc::clone(snapshot),
                reply: reply.clone(),
            };
            if let Err(channel::SendError(job)) = jobs.send(job) {
                let _ = reply.send((job.route, Err(UnitError::Panic("unit pool closed".into()))));
            }
            submitted += 1;
        }
        drop(reply);
        results
            .iter()
            .take(submitted)
            .inspect(|(_, result)| {
                if let Some(progress) = progress {
                    progress.inc(result.is_ok());
                }
            })
            .collect()
    }
}

impl Drop for UnitPool {
    fn drop(&mut self) {
        self.jobs.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn run_worker(jobs: &Receiver<Job>, collab: &Collaborators) {
    for Job {
        route,
        snapshot,
        reply,
    } in jobs.iter()
    {
        debug!("unit"; "{}", route);
        let result = catch_unwind(AssertUnwindSafe(|| generate(&route, &snapshot, collab)))
            .unwrap_or_else(|payload| Err(UnitError::Panic(panic_message(payload.as_ref()))));
        let _ = reply.send((route, result));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unit panicked".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bad props"));
        assert_eq!(panic_message(payload.as_ref()), "bad props");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unit panicked");
    }
}
