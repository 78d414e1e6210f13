use super::ingest::connect;
use crate::alert::{
    AlertEvaluator, ConsoleSink, FileMetricsSource, MetricsSource, StoreMetricsSource,
};
use crate::app::config::{AlertSettings, StoreSettings};
use crate::domain::MonitorError;
use crate::store::WindowQuery;
use tokio_util::sync::CancellationToken;

pub async fn run(
    store_settings: &StoreSettings,
    settings: &AlertSettings,
    cancel: CancellationToken,
) -> Result<(), MonitorError> {
    match &settings.source_file {
        Some(path) => evaluate(FileMetricsSource::new(path), settings, cancel).await,
        None => {
            let store = connect(store_settings, false)?;
            let query = WindowQuery::new(&store_settings.index_prefix, settings.window_minutes)
                .with_max_docs(settings.max_window_docs);
            evaluate(StoreMetricsSource::new(store, query), settings, cancel).await
        }
    }
}

async fn evaluate<S: MetricsSource>(
    source: S,
    settings: &AlertSettings,
    cancel: CancellationToken,
) -> Result<(), MonitorError> {
    if !settings.once {
        println!(
            "Starting continuous monitoring of {} (interval: {}s)",
            source.describe(),
            settings.interval.as_secs()
        );
        println!("Press Ctrl+C to stop");
    }

    let summary = AlertEvaluator::new(source, ConsoleSink, settings.thresholds.clone())
        .verbose(settings.verbose)
        .run(settings.interval, settings.once, cancel)
        .await;

    if settings.once
        && let Some(error) = summary.last_error
    {
        return Err(MonitorError::Evaluation(error));
    }
    if !settings.once {
        println!("Monitoring stopped after {} cycle(s)", summary.cycles);
    }
    Ok(())
}
