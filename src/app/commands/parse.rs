use super::read_log;
use crate::app::config::ParseSettings;
use crate::domain::MonitorError;
use crate::metrics::{Breakdown, MetricsSnapshot, aggregate, breakdown};
use crate::parser::ParsedBatch;
use crate::store::StoreDocument;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Summary and breakdown of one parsed file.
#[derive(Debug, Clone, Serialize)]
pub struct ParseReport {
    pub source_file: String,
    pub rejected_lines: usize,
    pub summary: MetricsSnapshot,
    pub breakdown: Breakdown,
}

impl ParseReport {
    pub fn new(source_file: &Path, batch: &ParsedBatch) -> Self {
        Self {
            source_file: source_file.display().to_string(),
            rejected_lines: batch.rejected(),
            summary: aggregate(&batch.records),
            breakdown: breakdown(&batch.records),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExportMetadata<'a> {
    source_file: &'a str,
    parsed_at: DateTime<Utc>,
    total_log_entries: usize,
    rejected_lines: usize,
}

#[derive(Debug, Serialize)]
struct ExportMetrics<'a> {
    summary: &'a MetricsSnapshot,
    #[serde(flatten)]
    breakdown: &'a Breakdown,
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    metadata: ExportMetadata<'a>,
    metrics: ExportMetrics<'a>,
    logs: Vec<StoreDocument>,
}

pub fn run(settings: &ParseSettings) -> Result<(), MonitorError> {
    let batch = read_log(&settings.logfile)?;
    let report = ParseReport::new(&settings.logfile, &batch);

    if settings.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| MonitorError::Export(e.to_string()))?;
        println!("{json}");
    } else {
        print!("{}", render_summary(&report));
    }

    if let Some(output) = &settings.output {
        export_json(output, &report, &batch)?;
        if !settings.json {
            println!("\nStructured data exported to: {}", output.display());
        }
    }

    Ok(())
}

/// Human-readable summary, one fact per line.
pub fn render_summary(report: &ParseReport) -> String {
    let summary = &report.summary;
    let ms = |value: Option<f64>| value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}ms"));
    let mut out = String::new();

    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out, "LOG ANALYSIS SUMMARY");
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out, "Total Transactions: {}", summary.total_count);
    let _ = writeln!(out, "Total Errors: {}", summary.error_count);
    let _ = writeln!(out, "Error Rate: {:.2}%", summary.error_rate * 100.0);
    let _ = writeln!(out, "Average Response Time: {}", ms(summary.avg_latency_ms));
    let _ = writeln!(out, "P95 Response Time: {}", ms(summary.p95_latency_ms));
    let _ = writeln!(out, "P99 Response Time: {}", ms(summary.p99_latency_ms));
    let _ = writeln!(out, "Unique Users: {}", report.breakdown.unique_users);
    let _ = writeln!(out, "Unique Routes: {}", report.breakdown.routes.len());
    if report.rejected_lines > 0 {
        let _ = writeln!(out, "Rejected Lines: {}", report.rejected_lines);
    }

    if !report.breakdown.errors_by_status.is_empty() {
        let _ = writeln!(out, "\nError Breakdown by Status Code:");
        for (status, count) in &report.breakdown.errors_by_status {
            let _ = writeln!(out, "  {status}: {count} errors");
        }
    }

    if !report.breakdown.routes.is_empty() {
        let _ = writeln!(out, "\nRoute Performance:");
        for (route, metrics) in &report.breakdown.routes {
            let _ = writeln!(out, "  {route}:");
            let _ = writeln!(out, "    Requests: {}", metrics.total_count);
            let _ = writeln!(out, "    Avg Response Time: {}", ms(metrics.avg_latency_ms));
            let _ = writeln!(out, "    Error Rate: {:.2}%", metrics.error_rate * 100.0);
        }
    }

    out
}

fn export_json(path: &Path, report: &ParseReport, batch: &ParsedBatch) -> Result<(), MonitorError> {
    let document = ExportDocument {
        metadata: ExportMetadata {
            source_file: &report.source_file,
            parsed_at: Utc::now(),
            total_log_entries: batch.accepted(),
            rejected_lines: batch.rejected(),
        },
        metrics: ExportMetrics {
            summary: &report.summary,
            breakdown: &report.breakdown,
        },
        logs: batch.records.iter().map(StoreDocument::from).collect(),
    };

    let file = File::create(path)
        .map_err(|e| MonitorError::Export(format!("{}: {}", path.display(), e)))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &document)
        .map_err(|e| MonitorError::Export(format!("{}: {}", path.display(), e)))?;

    info!("Exported {} records to {}", batch.accepted(), path.display());
    Ok(())
}
