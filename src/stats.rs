//! Aggregated per-path totals and the table that holds them.
//!
//! [`Totals`] forms a commutative monoid under `+=`/`-=`, which is what makes
//! the cross-thread delta merge correct: merging is addition in this monoid
//! and any merge order yields the same table.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{AddAssign, SubAssign};
use std::time::Duration;

use crate::path::ScopePath;

/// Accumulated time and visit count for one scope path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Totals {
    pub total_time: Duration,
    pub visits: u64,
}

impl Totals {
    /// Mean time per visit; zero if the path was never visited.
    pub fn average(&self) -> Duration {
        if self.visits == 0 {
            Duration::from_secs(0)
        } else {
            self.total_time / self.visits as u32
        }
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Totals) {
        self.total_time += rhs.total_time;
        self.visits += rhs.visits;
    }
}

impl SubAssign for Totals {
    // Saturating: a snapshot taken before a reset must not underflow the
    // zeroed table it is subtracted from.
    fn sub_assign(&mut self, rhs: Totals) {
        self.total_time = self.total_time.saturating_sub(rhs.total_time);
        self.visits = self.visits.saturating_sub(rhs.visits);
    }
}

/// Ordered map from scope path to [`Totals`], one entry per distinct path.
///
/// Entries are created on first visit and never implicitly deleted: a reset
/// zeroes the totals but keeps the key set stable, so reports based on a
/// just-reset table stay well defined.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    entries: BTreeMap<ScopePath, Totals>,
}

impl Stats {
    pub fn new() -> Self {
        Stats::default()
    }

    pub fn get(&self, path: &ScopePath) -> Option<&Totals> {
        self.entries.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScopePath, &Totals)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold one finished measurement into the table.
    pub(crate) fn record(&mut self, path: ScopePath, elapsed: Duration) {
        let totals = self.entries.entry(path).or_default();
        totals.visits += 1;
        totals.total_time += elapsed;
    }

    /// Reset every total to the monoid identity, keeping all known paths.
    pub fn zero(&mut self) {
        for totals in self.entries.values_mut() {
            *totals = Totals::default();
        }
    }
}

impl AddAssign<&Stats> for Stats {
    fn add_assign(&mut self, rhs: &Stats) {
        for (path, totals) in rhs.entries.iter() {
            *self.entries.entry(*path).or_default() += *totals;
        }
    }
}

impl SubAssign<&Stats> for Stats {
    fn sub_assign(&mut self, rhs: &Stats) {
        for (path, totals) in rhs.entries.iter() {
            *self.entries.entry(*path).or_default() -= *totals;
        }
    }
}

impl fmt::Display for Stats {
    /// One line per path: `scope/path: AVG μs (TOTAL μs / VISITS)`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (path, totals) in self.entries.iter() {
            let total_us = totals.total_time.as_micros();
            writeln!(
                f,
                "{}: {} μs ({} μs / {})",
                path,
                total_us as f64 / totals.visits as f64,
                total_us,
                totals.visits
            )?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Stats {
    /// Serializes as a map from rendered path string to totals.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, totals) in self.entries.iter() {
            map.serialize_entry(&path.to_string(), totals)?;
        }
        map.end()
    }
}
