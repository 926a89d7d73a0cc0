//! The per-thread recording machinery: the scope stack, the pending
//! measurement buffer, and the aggregation step that folds finished
//! measurements into the thread's stats table.
//!
//! Everything here touches thread-local state only. `begin`/`end`/`aggregate`
//! never block and never reach for shared memory; the one lock in the crate
//! lives in [`global`].

#[cfg(feature = "multithread")]
pub mod global;

use std::cell::RefCell;
use std::time::Instant;

use crate::path::{ScopePath, Tag};
use crate::stats::Stats;

/// One timed interval, tagged with the scope path active when it started.
/// Running while `stop` is `None`; stamped exactly once on `end()`.
#[derive(Clone, Copy, Debug)]
struct Measure {
    path: ScopePath,
    start: Instant,
    stop: Option<Instant>,
}

/// Per-thread profiler state. All members are value types; the state is torn
/// down with the thread and needs no explicit cleanup.
#[derive(Debug, Default)]
pub(crate) struct ThreadProfiler {
    current: ScopePath,
    pending: Vec<Measure>,
    stats: Stats,
}

impl ThreadProfiler {
    fn new() -> Self {
        ThreadProfiler::default()
    }

    fn begin(&mut self, tag: Tag) {
        self.current.push(tag);
        self.pending.push(Measure {
            path: self.current,
            start: Instant::now(),
            stop: None,
        });
    }

    /// Closes the innermost still-open measurement at the current depth.
    ///
    /// Scopes must close in LIFO order relative to `begin` calls on this
    /// thread; use [`ScopeGuard`] to guarantee the pairing across early
    /// returns and panics. Sibling scopes that reopen a depth a deeper scope
    /// just vacated are matched correctly because the scan keys on depth, not
    /// on insertion order alone.
    fn end(&mut self) {
        if self.current.is_empty() {
            warn!("scope-prof: end() called with no open scope");
            return;
        }
        let depth = self.current.len();
        let open = self
            .pending
            .iter_mut()
            .rev()
            .find(|m| m.stop.is_none() && m.path.len() == depth);
        match open {
            Some(measure) => measure.stop = Some(Instant::now()),
            None => debug_assert!(false, "no open measurement at depth {}", depth),
        }
        self.current.pop();
    }

    /// Folds every finished measurement into the stats table and keeps the
    /// still-running ones, in order. Already-folded measurements are gone, so
    /// repeated calls never double-count.
    fn aggregate(&mut self) {
        let mut unfinished = Vec::new();
        if self.pending.len() > 4 {
            unfinished.reserve(self.pending.len() >> 1);
        }
        for measure in self.pending.drain(..) {
            match measure.stop {
                Some(stop) => self.stats.record(measure.path, stop - measure.start),
                None => unfinished.push(measure),
            }
        }
        self.pending = unfinished;
    }

    /// Drops pending measurements and zeroes all totals, keeping known paths.
    fn clear(&mut self) {
        self.pending.clear();
        self.stats.zero();
    }

    #[cfg(test)]
    fn running(&self) -> usize {
        self.pending.iter().filter(|m| m.stop.is_none()).count()
    }
}

thread_local!(
    static PROFILER: RefCell<ThreadProfiler> = RefCell::new(ThreadProfiler::new());
);

/// Opens a scope named `tag` on the calling thread.
///
/// Prefer [`ScopeGuard`] or the [`profile!`](crate::profile) macro, which
/// guarantee the matching [`end`].
pub fn begin(tag: &'static str) {
    PROFILER.with(|p| p.borrow_mut().begin(Tag::new(tag)));
}

/// Closes the scope most recently opened by [`begin`] on the calling thread.
pub fn end() {
    PROFILER.with(|p| p.borrow_mut().end());
}

/// Folds finished measurements into the calling thread's stats table. Safe to
/// call at any cadence; each measurement is counted exactly once.
pub fn aggregate() {
    PROFILER.with(|p| p.borrow_mut().aggregate());
}

/// Snapshot of the calling thread's stats table.
pub fn thread_stats() -> Stats {
    PROFILER.with(|p| p.borrow().stats.clone())
}

/// Zeroes all totals while keeping every known path: the calling thread's
/// table, its last-published snapshot, and (with `multithread`) the global
/// table. Pending measurements are dropped. Publishing unchanged stats after
/// a reset contributes a zero delta.
pub fn reset() {
    PROFILER.with(|p| p.borrow_mut().clear());
    #[cfg(feature = "multithread")]
    global::reset_calling_thread();
}

/// Merges the calling thread's stats into the global table via delta merge.
#[cfg(feature = "multithread")]
pub fn publish() {
    PROFILER.with(|p| global::publish_stats(&p.borrow().stats));
}

/// No-op: the `multithread` feature is disabled.
#[cfg(not(feature = "multithread"))]
pub fn publish() {}

/// Snapshot of the global all-thread stats table.
#[cfg(feature = "multithread")]
pub fn global_stats() -> Stats {
    global::global_stats()
}

/// Empty: the `multithread` feature is disabled.
#[cfg(not(feature = "multithread"))]
pub fn global_stats() -> Stats {
    Stats::default()
}

/// Times its own lexical scope: [`begin`] on construction, [`end`] on drop.
/// The drop runs on early return and panic unwinding alike, which is what
/// keeps the LIFO pairing contract intact.
#[must_use = "the guard times its own lifetime; bind it to a variable"]
pub struct ScopeGuard {
    _private: (),
}

impl ScopeGuard {
    pub fn new(tag: &'static str) -> Self {
        begin(tag);
        ScopeGuard { _private: () }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn path_of(tags: &[&'static str]) -> ScopePath {
        let mut path = ScopePath::new();
        for tag in tags {
            path.push(Tag::new(tag));
        }
        path
    }

    #[test]
    fn nested_scopes_record_full_paths() {
        let mut prof = ThreadProfiler::new();
        prof.begin(Tag::new("outer"));
        prof.begin(Tag::new("inner"));
        prof.end();
        prof.end();
        prof.aggregate();

        assert_eq!(prof.stats.len(), 2);
        assert_eq!(prof.stats.get(&path_of(&["outer"])).unwrap().visits, 1);
        assert_eq!(
            prof.stats.get(&path_of(&["outer", "inner"])).unwrap().visits,
            1
        );
        assert_eq!(prof.running(), 0);
    }

    #[test]
    fn sibling_scopes_at_the_same_depth_are_matched() {
        let mut prof = ThreadProfiler::new();
        prof.begin(Tag::new("parent"));
        prof.begin(Tag::new("first"));
        prof.end();
        prof.begin(Tag::new("second"));
        prof.end();
        prof.end();
        prof.aggregate();

        assert_eq!(
            prof.stats.get(&path_of(&["parent", "first"])).unwrap().visits,
            1
        );
        assert_eq!(
            prof.stats.get(&path_of(&["parent", "second"])).unwrap().visits,
            1
        );
        assert_eq!(prof.running(), 0);
    }

    #[test]
    fn aggregate_keeps_running_measurements() {
        let mut prof = ThreadProfiler::new();
        prof.begin(Tag::new("outer"));
        prof.begin(Tag::new("inner"));
        prof.end();
        prof.aggregate();

        // inner is folded, outer still runs
        assert_eq!(prof.stats.len(), 1);
        assert_eq!(prof.running(), 1);

        prof.end();
        prof.aggregate();
        assert_eq!(prof.stats.get(&path_of(&["outer"])).unwrap().visits, 1);
        assert_eq!(prof.running(), 0);
    }

    #[test]
    fn aggregation_is_monotonic_across_partitions() {
        // Five visits split across three aggregate() calls still sum to five.
        let mut prof = ThreadProfiler::new();
        for round in 0..5 {
            prof.begin(Tag::new("work"));
            prof.end();
            if round % 2 == 0 {
                prof.aggregate();
            }
        }
        prof.aggregate();
        prof.aggregate();

        let totals = prof.stats.get(&path_of(&["work"])).unwrap();
        assert_eq!(totals.visits, 5);
    }

    #[test]
    fn measured_time_accumulates() {
        let mut prof = ThreadProfiler::new();
        for _ in 0..2 {
            prof.begin(Tag::new("sleepy"));
            std::thread::sleep(Duration::from_millis(5));
            prof.end();
        }
        prof.aggregate();

        let totals = prof.stats.get(&path_of(&["sleepy"])).unwrap();
        assert_eq!(totals.visits, 2);
        assert!(totals.total_time >= Duration::from_millis(10));
        assert!(totals.average() >= Duration::from_millis(5));
    }

    #[test]
    fn clear_zeroes_totals_and_drops_pending() {
        let mut prof = ThreadProfiler::new();
        prof.begin(Tag::new("done"));
        prof.end();
        prof.begin(Tag::new("still-open"));
        prof.aggregate();
        prof.clear();

        assert_eq!(prof.pending.len(), 0);
        assert_eq!(prof.stats.len(), 1);
        assert_eq!(prof.stats.get(&path_of(&["done"])).unwrap().visits, 0);
    }

    #[test]
    fn guard_closes_on_drop_and_unwind() {
        {
            let _outer = ScopeGuard::new("guard-outer");
            let _inner = ScopeGuard::new("guard-inner");
        }
        let result = std::panic::catch_unwind(|| {
            let _g = ScopeGuard::new("guard-panicky");
            panic!("boom");
        });
        assert!(result.is_err());
        aggregate();

        let stats = thread_stats();
        assert_eq!(stats.get(&path_of(&["guard-outer"])).unwrap().visits, 1);
        assert_eq!(
            stats
                .get(&path_of(&["guard-outer", "guard-inner"]))
                .unwrap()
                .visits,
            1
        );
        assert_eq!(stats.get(&path_of(&["guard-panicky"])).unwrap().visits, 1);
    }
}
