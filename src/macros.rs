//! Internal diagnostics. With the `log` feature these forward to the `log`
//! crate; without it, warnings and errors fall back to stderr and traces are
//! dropped.

#[allow(unused_macros)]
macro_rules! trace {
    ($($args: expr),*) => {
        #[cfg(feature="log")]
        log::trace!($($args),*);
    }
}

macro_rules! warn {
    ($($args: expr),*) => {
        #[cfg(feature="log")]
        log::warn!($($args),*);
        #[cfg(not(feature="log"))]
        eprintln!($($args),*);
    }
}

#[allow(unused_macros)]
macro_rules! error {
    ($($args: expr),*) => {
        #[cfg(feature="log")]
        log::error!($($args),*);
        #[cfg(not(feature="log"))]
        eprintln!($($args),*);
    }
}
