//! One handler per subcommand. Reports go to stdout, diagnostics to the
//! tracing subscriber.

pub mod alert;
pub mod ingest;
pub mod parse;

use super::config::{CommandSettings, MonitorConfig};
use crate::domain::MonitorError;
use crate::parser::{ParsedBatch, parse_file};
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn execute(config: MonitorConfig, cancel: CancellationToken) -> Result<(), MonitorError> {
    match &config.command {
        CommandSettings::Parse(settings) => parse::run(settings),
        CommandSettings::Ingest(settings) => ingest::run(&config.store, settings, cancel).await,
        CommandSettings::Alert(settings) => alert::run(&config.store, settings, cancel).await,
    }
}

fn read_log(path: &Path) -> Result<ParsedBatch, MonitorError> {
    parse_file(path).map_err(|source| MonitorError::LogFile {
        path: path.display().to_string(),
        source,
    })
}
