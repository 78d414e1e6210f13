pub mod commands;
pub mod config;
pub mod logging;
pub mod shutdown;

use crate::domain::MonitorError;
use clap::Parser;
use config::{Cli, MonitorConfig};
use std::process::ExitCode;
use tracing::debug;

/// Parse arguments, resolve configuration and run the selected command.
pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    exit_code(run(&cli).await)
}

pub async fn run(cli: &Cli) -> Result<(), MonitorError> {
    let config = MonitorConfig::resolve(cli)?;
    logging::init_logging(&config.logging)?;
    debug!("Resolved configuration: {:?}", config);

    let cancel = shutdown::cancel_on_signal();
    let result = commands::execute(config, cancel.clone()).await;
    // Stops the signal watcher
    cancel.cancel();
    result
}

fn exit_code(result: Result<(), MonitorError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Printed directly: logging may not be initialized yet
            eprintln!("{}", error_line(&e));
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

fn error_line(error: &MonitorError) -> String {
    format!("Error: {error}")
}
