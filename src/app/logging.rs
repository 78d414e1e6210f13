use super::config::{LogFormat, LoggingSettings};
use crate::domain::MonitorError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// HTTP stack crates that are noisy below warn.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// Filter for `settings`, refined by `RUST_LOG` when set.
pub fn build_filter(settings: &LoggingSettings) -> Result<EnvFilter, MonitorError> {
    let level = tracing::Level::from(settings.level);
    let mut directives = vec![level.to_string().to_lowercase()];
    directives.extend(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")));

    if let Ok(extra) = std::env::var("RUST_LOG")
        && !extra.trim().is_empty()
    {
        directives.push(extra);
    }

    EnvFilter::try_new(directives.join(","))
        .map_err(|e| MonitorError::Logging(format!("Invalid log filter: {e}")))
}

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// the command's report.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), MonitorError> {
    let filter = build_filter(settings)?;

    let result = match settings.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .try_init(),
    };

    result.map_err(|e| MonitorError::Logging(e.to_string()))
}
