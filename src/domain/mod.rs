//! Domain layer for rask-log-monitor.
//!
//! Contains the canonical types shared across all modules:
//! - `LogRecord`: One parsed transaction event
//! - `Outcome`: Success/error classification of a transaction
//! - `MonitorError`: Top-level error type

pub mod error;
pub mod log_record;

pub use error::MonitorError;
pub use log_record::{LogRecord, Outcome};
