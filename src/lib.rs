//! Nested-scope instrumentation profiler.
//!
//! Callers bracket code regions with named scope markers; the library records
//! elapsed time per *nested scope path* (e.g. `main/heavyCalc/hugePower`) and
//! aggregates per-path visit counts and total time. Recording is done in
//! thread-local buffers with no locking, in an attempt to keep the bracketing
//! primitive cheap enough for paths hit millions of times per second.
//!
//! Disabling the `profile` feature replaces every operation with a no-op and
//! [`ScopeGuard`] with an empty struct, allowing you to roll release builds
//! without the profiler overhead and also without modifying code.
//!
//! ## Features
//!
//! | Name          | Enabled by default | Description                                                              |
//! | ------------- | ------------------ | ------------------------------------------------------------------------ |
//! | `profile`     | `true`             | Master switch. Disabling it compiles all operations down to no-ops.      |
//! | `multithread` | `true`             | The cross-thread merge ([`publish`] / [`global_stats`]).                 |
//! | `serde`       | `false`            | `Serialize` for [`Stats`] / [`Totals`] snapshots.                        |
//! | `log`         | `false`            | Internal diagnostics via the log crate, instead of stderr.               |
//!
//! ## Example
//!
//! ```
//! use scope_prof::profile;
//!
//! fn heavy_calc() {
//!     profile!("heavyCalc");
//!
//!     {
//!         profile!("FirstPowerLoop");
//!         // hot loop...
//!     }
//! }
//!
//! heavy_calc();
//! scope_prof::aggregate();
//!
//! // Prints something similar to:
//! //
//! // heavyCalc: 12 μs (12 μs / 1)
//! // heavyCalc/FirstPowerLoop: 3 μs (3 μs / 1)
//! print!("{}", scope_prof::thread_stats());
//! ```
//!
//! Scope paths deeper than [`MAX_DEPTH`] are recorded lossily: the extra tags
//! are dropped while the depth keeps counting, and the report marks such
//! paths with `/...(n)`. Tags are compared by identity, so reuse the same
//! string literal (or interned string) for the same scope.
//!
//! Worker threads call [`publish`] to merge their tables into the global one;
//! the merge is delta-based, so publishing at any cadence never double-counts.
//! A thread that exits without a final [`publish`] loses whatever it had not
//! published yet.

#[macro_use]
mod macros;

mod path;
mod stats;

#[cfg(feature = "profile")]
mod profiler;

pub use crate::path::{ScopePath, Tag, MAX_DEPTH};
pub use crate::profiler::{
    aggregate, begin, end, global_stats, publish, reset, thread_stats, ScopeGuard,
};
pub use crate::stats::{Stats, Totals};

/// Times the rest of the enclosing block under the given scope name.
#[macro_export]
macro_rules! profile {
    ($name: expr) => {
        let _profile = $crate::ScopeGuard::new($name);
    };
}

/// Times the rest of the enclosing function, using the function's name as the
/// scope tag.
#[macro_export]
macro_rules! profile_fn {
    () => {
        let _profile = {
            fn f() {}
            fn type_name_of<T>(_: T) -> &'static str {
                std::any::type_name::<T>()
            }
            let name = type_name_of(f);
            // trim the trailing "::f"
            $crate::ScopeGuard::new(&name[..name.len() - 3])
        };
    };
}

// In case profiling is disabled we replace the `ScopeGuard` struct with a
// unit struct and every operation with a no-op, so instrumented call sites
// compile unchanged.
#[cfg(not(feature = "profile"))]
mod profiler {
    use crate::stats::Stats;

    #[must_use = "the guard times its own lifetime; bind it to a variable"]
    pub struct ScopeGuard;

    impl ScopeGuard {
        pub fn new(_tag: &'static str) -> Self {
            ScopeGuard
        }
    }

    pub fn begin(_tag: &'static str) {}
    pub fn end() {}
    pub fn aggregate() {}
    pub fn reset() {}

    pub fn thread_stats() -> Stats {
        Stats::default()
    }

    pub fn publish() {}

    pub fn global_stats() -> Stats {
        Stats::default()
    }
}
