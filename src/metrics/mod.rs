//! Summary statistics over parsed records.
//!
//! Everything here is a pure function of the records supplied: no hidden
//! state, no I/O.

pub mod breakdown;
pub mod snapshot;

pub use breakdown::{Breakdown, breakdown};
pub use snapshot::{MetricsSnapshot, TimeWindow, aggregate, latency_percentile, percentile};
