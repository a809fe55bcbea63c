//! Feature-gated logging macros.
//!
//! With the `tracing` feature the macros below forward to the `tracing` crate;
//! without it they expand to nothing, so the hot CAS loops carry no logging
//! cost in normal builds.
//!
//! ```bash
//! # Run the stress tests with expansion and retry events visible
//! RUST_LOG=hashtrie::trie=trace cargo test --features tracing --test stress_tests
//! ```
//!
//! Functions that deserve a span use
//! `#[cfg_attr(feature = "tracing", tracing::instrument(...))]` directly.

#![allow(unused_macros, unused_imports)]

/// Trace-level event: per-retry noise (lost CAS races, converting waits).
#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

/// Debug-level event: structural changes (array node published).
#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// Warn-level event: caller-visible anomalies (full-width hash collision).
#[cfg(feature = "tracing")]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        tracing::warn!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_log {
    ($($arg:tt)*) => {};
}

/// Error-level event: broken internal invariants.
#[cfg(feature = "tracing")]
macro_rules! error_log {
    ($($arg:tt)*) => {
        tracing::error!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! error_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;
pub(crate) use error_log;
pub(crate) use trace_log;
pub(crate) use warn_log;
