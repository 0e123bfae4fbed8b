//! Debounce lanes.
//!
//! ```text
//!            event                 deadline passed
//!   Idle ─────────────► Scheduled ─────────────────► Running
//!    ▲                   │    ▲                        │  │
//!    │                   └────┘ event: reset deadline  │  │ event: pending = true
//!    │                                                 │  ▼
//!    └──────────── finish (no pending) ────────────────┘  finish (pending):
//!                                                         Scheduled { deadline: now }
//! ```
//!
//! Lanes never read the clock themselves; every transition takes `now`.

use std::hash::Hash;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneState {
    Idle,
    Scheduled { deadline: Instant },
    Running { pending: bool },
}

#[derive(Debug, Clone)]
pub struct Lane {
    state: LaneState,
    debounce: Duration,
}

impl Lane {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: LaneState::Idle,
            debounce,
        }
    }

    pub fn state(&self) -> LaneState {
        self.state
    }

    /// Record a trigger. Events while running are remembered, never dropped.
    pub fn event(&mut self, now: Instant) {
        self.state = match self.state {
            LaneState::Idle | LaneState::Scheduled { .. } => LaneState::Scheduled {
                deadline: now + self.debounce,
            },
            LaneState::Running { .. } => LaneState::Running { pending: true },
        };
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            LaneState::Scheduled { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| deadline <= now)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LaneState::Running { .. })
    }

    /// Move a due lane to `Running`. Returns false if it was not due.
    pub fn start(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.state = LaneState::Running { pending: false };
        true
    }

    /// Work finished. A pending trigger re-schedules immediately.
    pub fn finish(&mut self, now: Instant) {
        self.state = match self.state {
            LaneState::Running { pending: true } => LaneState::Scheduled { deadline: now },
            _ => LaneState::Idle,
        };
    }
}

/// One lane per key: triggers for the same key coalesce, different keys
/// proceed independently.
#[derive(Debug)]
pub struct KeyedLanes<K> {
    lanes: FxHashMap<K, Lane>,
    debounce: Duration,
}

impl<K: Hash + Eq + Clone + Ord> KeyedLanes<K> {
    pub fn new(debounce: Duration) -> Self {
        Self {
            lanes: FxHashMap::default(),
            debounce,
        }
    }

    pub fn event(&mut self, key: K, now: Instant) {
        let debounce = self.debounce;
        self.lanes
            .entry(key)
            .or_insert_with(|| Lane::new(debounce))
            .event(now);
    }

    /// Keys whose deadline has passed, sorted.
    pub fn due(&self, now: Instant) -> Vec<K> {
        let mut keys: Vec<K> = self
            .lanes
            .iter()
            .filter(|(_, lane)| lane.is_due(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn start(&mut self, key: &K, now: Instant) -> bool {
        self.lanes.get_mut(key).is_some_and(|lane| lane.start(now))
    }

    pub fn finish(&mut self, key: &K, now: Instant) {
        if let Some(lane) = self.lanes.get_mut(key) {
            lane.finish(now);
            if lane.state() == LaneState::Idle {
                self.lanes.remove(key);
            }
        }
    }

    /// Drop the lane of a key that no longer exists. A running lane is left
    /// to finish but loses its pending trigger.
    pub fn forget(&mut self, key: &K) {
        match self.lanes.get_mut(key) {
            Some(lane) if lane.is_running() => lane.state = LaneState::Running { pending: false },
            Some(_) => {
                self.lanes.remove(key);
            }
            None => {}
        }
    }

    #[cfg(test)]
    pub fn state(&self, key: &K) -> LaneState {
        self.lanes
            .get(key)
            .map(Lane::state)
            .unwrap_or(LaneState::Idle)
    }

    #[cfg(test)]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lanes.values().filter_map(Lane::deadline).min()
    }

    /// Earliest deadline strictly after `now`.
    pub fn next_deadline_after(&self, now: Instant) -> Option<Instant> {
        self.lanes
            .values()
            .filter_map(Lane::deadline)
            .filter(|deadline| *deadline > now)
            .min()
    }

    pub fn any_running(&self) -> bool {
        self.lanes.values().any(Lane::is_running)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_lane_cycle() {
        let t0 = Instant::now();
        let mut lane = Lane::new(DEBOUNCE);
        assert_eq!(lane.state(), LaneState::Idle);
        assert!(!lane.start(t0));

        lane.event(t0);
        assert_eq!(lane.deadline(), Some(t0 + DEBOUNCE));
        assert!(!lane.start(t0 + ms(50)));
        assert!(lane.start(t0 + DEBOUNCE));
        assert!(lane.is_running());

        lane.finish(t0 + ms(150));
        assert_eq!(lane.state(), LaneState::Idle);
    }

    #[test]
    fn test_events_reset_deadline() {
        let t0 = Instant::now();
        let mut lane = Lane::new(DEBOUNCE);
        lane.event(t0);
        lane.event(t0 + ms(80));
        assert!(!lane.is_due(t0 + ms(120)));
        assert!(lane.is_due(t0 + ms(180)));
    }

    #[test]
    fn test_event_while_running_reschedules_immediately() {
        let t0 = Instant::now();
        let mut lane = Lane::new(DEBOUNCE);
        lane.event(t0);
        assert!(lane.start(t0 + DEBOUNCE));

        lane.event(t0 + ms(120));
        lane.event(t0 + ms(130));
        assert_eq!(lane.state(), LaneState::Running { pending: true });

        let done = t0 + ms(400);
        lane.finish(done);
        assert_eq!(lane.state(), LaneState::Scheduled { deadline: done });
        assert!(lane.start(done));
    }

    #[test]
    fn test_same_key_coalesces() {
        let t0 = Instant::now();
        let mut lanes = KeyedLanes::new(DEBOUNCE);
        for i in 0..10 {
            lanes.event("/about/", t0 + ms(i * 5));
        }

        let now = t0 + ms(200);
        let due = lanes.due(now);
        assert_eq!(due, vec!["/about/"]);
        let started: Vec<_> = due.iter().filter(|k| lanes.start(k, now)).collect();
        assert_eq!(started.len(), 1);
        assert!(lanes.due(now).is_empty());
    }

    #[test]
    fn test_distinct_keys_run_independently() {
        let t0 = Instant::now();
        let mut lanes = KeyedLanes::new(DEBOUNCE);
        let keys = ["/a/", "/b/", "/c/", "/d/"];
        for key in keys {
            lanes.event(key, t0);
        }

        let now = t0 + DEBOUNCE;
        let due = lanes.due(now);
        assert_eq!(due, keys.to_vec());
        for key in &due {
            assert!(lanes.start(key, now));
        }
        assert!(lanes.any_running());

        // finishing one does not touch the others
        lanes.finish(&"/a/", now);
        assert_eq!(lanes.state(&"/a/"), LaneState::Idle);
        assert_eq!(lanes.state(&"/b/"), LaneState::Running { pending: false });
    }

    #[test]
    fn test_forget_drops_scheduled_and_pending_work() {
        let t0 = Instant::now();
        let mut lanes = KeyedLanes::new(DEBOUNCE);
        lanes.event("/gone/", t0);
        lanes.event("/busy/", t0);
        assert!(lanes.start(&"/busy/", t0 + DEBOUNCE));
        lanes.event("/busy/", t0 + ms(110));

        lanes.forget(&"/gone/");
        lanes.forget(&"/busy/");
        lanes.forget(&"/never/");
        assert_eq!(lanes.state(&"/gone/"), LaneState::Idle);
        assert_eq!(lanes.state(&"/busy/"), LaneState::Running { pending: false });

        lanes.finish(&"/busy/", t0 + ms(200));
        assert!(lanes.is_empty());
    }

    #[test]
    fn test_next_deadline_is_earliest() {
        let t0 = Instant::now();
        let mut lanes = KeyedLanes::new(DEBOUNCE);
        assert_eq!(lanes.next_deadline(), None);
        lanes.event(2, t0 + ms(30));
        lanes.event(1, t0);
        assert_eq!(lanes.next_deadline(), Some(t0 + DEBOUNCE));
        assert!(lanes.start(&1, t0 + DEBOUNCE));
        assert_eq!(lanes.next_deadline(), Some(t0 + ms(130)));
        assert_eq!(lanes.next_deadline_after(t0 + ms(130)), None);
        lanes.finish(&1, t0 + DEBOUNCE);
        assert!(!lanes.is_empty());
    }
}
