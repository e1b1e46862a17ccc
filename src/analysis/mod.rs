//! Analysis modules.
//!
//! Aggregation of municipality records into department statistics.

pub mod aggregator;

pub use aggregator::*;
