#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Safe within realistic value bounds (ranks, counts)
    clippy::cast_precision_loss,      // Acceptable for metrics/display
    clippy::cast_sign_loss,           // Safe where values are known non-negative
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. StoreError in store module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod alert;
pub mod app;
pub mod domain;
pub mod metrics;
pub mod parser;
pub mod reliability;
pub mod store;

// Re-export main types for easy access
pub use alert::{AlertEvaluator, AlertThresholdConfig};
pub use domain::{LogRecord, MonitorError, Outcome};
pub use metrics::{MetricsSnapshot, aggregate};
pub use parser::{LogRecordParser, ParseError};
pub use store::{IngestionClient, IngestionReport, StoreClient};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
