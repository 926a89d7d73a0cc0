//! Cross-thread merge: folds each thread's stats table into one process-wide
//! view without double-counting.
//!
//! Each thread publishes a snapshot of its own table; the aggregator keeps,
//! per thread, the last snapshot it merged, and applies only the difference.
//! Re-publishing unchanged stats therefore contributes nothing, and merges
//! from different threads commute, so any publish order converges to the same
//! global table. This is the only place in the crate that takes a lock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use lazy_static::lazy_static;

use crate::stats::Stats;

struct State {
    all: Stats,
    last_published: HashMap<ThreadId, Stats>,
}

/// Process-wide stats table plus the per-thread last-published snapshots,
/// behind a single mutex.
pub(crate) struct Aggregator {
    inner: Mutex<State>,
}

impl Aggregator {
    pub fn new() -> Self {
        Aggregator {
            inner: Mutex::new(State {
                all: Stats::new(),
                last_published: HashMap::new(),
            }),
        }
    }

    /// Merges `stats` for the thread `id`: applies `stats - last_published`
    /// to the global table, then remembers `stats` as the new snapshot.
    ///
    /// Idempotent for an unchanged `stats`, and safe to call repeatedly with
    /// a growing one; paths never published by this thread before count as a
    /// zero prior contribution.
    pub fn publish(&self, id: ThreadId, stats: &Stats) {
        let mut state = self.inner.lock().expect("all-thread stats lock poisoned");
        trace!("merging {} scope paths into the all-thread stats", stats.len());
        let mut delta = stats.clone();
        if let Some(last) = state.last_published.get(&id) {
            delta -= last;
        }
        state.all += &delta;
        state.last_published.insert(id, stats.clone());
    }

    /// Cloned snapshot of the global table. A best-effort live view: other
    /// threads may publish right after the clone.
    pub fn stats(&self) -> Stats {
        self.inner
            .lock()
            .expect("all-thread stats lock poisoned")
            .all
            .clone()
    }

    /// Zeroes every total in the global table and in `id`'s last-published
    /// snapshot, preserving all known paths. Other threads' snapshots are
    /// left alone so their next publish still contributes only what they
    /// accrued since they last published.
    pub fn reset(&self, id: ThreadId) {
        let mut state = self.inner.lock().expect("all-thread stats lock poisoned");
        state.all.zero();
        if let Some(last) = state.last_published.get_mut(&id) {
            last.zero();
        }
    }
}

lazy_static! {
    static ref GLOBAL: Aggregator = Aggregator::new();
}

pub(crate) fn publish_stats(stats: &Stats) {
    GLOBAL.publish(thread::current().id(), stats);
}

pub(crate) fn global_stats() -> Stats {
    GLOBAL.stats()
}

pub(crate) fn reset_calling_thread() {
    GLOBAL.reset(thread::current().id());
}
