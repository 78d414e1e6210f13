//! Threshold alerting over a window of records.
//!
//! The evaluator pulls records from a [`MetricsSource`], aggregates them with
//! the same code as the one-shot report and prints one line per breached rule.

pub mod evaluator;
pub mod sink;
pub mod source;
pub mod thresholds;

pub use evaluator::{Alert, AlertEvaluator, CycleReport, EvaluatorState, RunSummary, evaluate};
pub use sink::{ConsoleSink, MemorySink, ReportSink};
pub use source::{
    FileMetricsSource, MetricsSource, RecordsMetricsSource, SourceError, StoreMetricsSource,
};
pub use thresholds::{AlertThresholdConfig, Comparison, Metric, RuleCheck, Severity, ThresholdRule};
