use super::read_log;
use crate::app::config::{ConfigError, IngestSettings, StoreSettings};
use crate::domain::MonitorError;
use crate::reliability::RetryPolicy;
use crate::store::{IngestionClient, IngestionReport, StoreClient, StoreError};
use std::fmt::Write as _;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Base delay between attempts of one bulk request.
const BATCH_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
/// Rejections listed in the console report.
const MAX_LISTED_ERRORS: usize = 10;

pub async fn run(
    store_settings: &StoreSettings,
    settings: &IngestSettings,
    cancel: CancellationToken,
) -> Result<(), MonitorError> {
    let batch = read_log(&settings.logfile)?;
    if batch.records.is_empty() {
        println!("No records to ingest ({} rejected lines)", batch.rejected());
        return Ok(());
    }

    let store = connect(store_settings, settings.compress)?;
    let startup = RetryPolicy::fixed(settings.startup_retries, settings.startup_retry_delay);
    match store.wait_until_ready(&startup, &cancel).await {
        Ok(()) => {}
        Err(StoreError::Cancelled) => return Err(MonitorError::Interrupted),
        Err(e) => return Err(MonitorError::Connection(e)),
    }

    let mut client = IngestionClient::new(&store, &store_settings.index_prefix)
        .with_batch_policy(RetryPolicy::backoff(settings.batch_attempts, BATCH_RETRY_BASE_DELAY));
    if let Some(index) = &settings.index {
        client = client.with_index(index.clone());
    }

    println!(
        "Ingesting {} records to {}{}",
        batch.accepted(),
        store.base_url(),
        client.index()
    );

    let report = tokio::select! {
        () = cancel.cancelled() => {
            warn!("Ingestion interrupted");
            return Err(MonitorError::Interrupted);
        }
        report = client.ingest(&batch.records, settings.batch_size) => report,
    };

    print!("{}", render_report(&report));

    if report.is_complete() {
        info!("All {} records ingested", report.accepted_count);
        Ok(())
    } else {
        Err(MonitorError::PartialIngestion {
            rejected: report.rejected_count,
            total: report.total(),
        })
    }
}

pub(crate) fn connect(settings: &StoreSettings, compress: bool) -> Result<StoreClient, MonitorError> {
    StoreClient::new(settings.client_config(compress)).map_err(|e| match e {
        StoreError::InvalidConfiguration(msg) => MonitorError::Config(ConfigError::InvalidUrl(msg)),
        other => MonitorError::Connection(other),
    })
}

pub fn render_report(report: &IngestionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nIngestion complete:");
    let _ = writeln!(out, "  Accepted: {}", report.accepted_count);
    let _ = writeln!(out, "  Rejected: {}", report.rejected_count);
    let _ = writeln!(out, "  Total: {}", report.total());
    let _ = writeln!(
        out,
        "  Batches: {} ({} failed)",
        report.batches.len(),
        report.failed_batches()
    );

    for rejected in report.errors.iter().take(MAX_LISTED_ERRORS) {
        let _ = writeln!(
            out,
            "  - record #{} ({}): {}",
            rejected.record.index + 1,
            rejected.record.transaction_id,
            rejected.reason
        );
    }
    if report.errors.len() > MAX_LISTED_ERRORS {
        let _ = writeln!(
            out,
            "  ... and {} more",
            report.errors.len() - MAX_LISTED_ERRORS
        );
    }

    out
}
