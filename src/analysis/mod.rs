//! Analysis modules.
//!
//! Aggregation over classified comments lives here; the session controller
//! and renderers only consume its results.

pub mod aggregator;

pub use aggregator::*;
