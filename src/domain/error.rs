use crate::app::config::ConfigError;
use crate::store::StoreError;
use thiserror::Error;

/// Top-level error type for the monitor.
///
/// Every variant renders as a single human-readable line; `exit_code()` maps
/// it to the process exit status.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store unreachable: {0}")]
    Connection(#[source] StoreError),

    #[error("Ingestion incomplete: {rejected} of {total} records rejected")]
    PartialIngestion { rejected: usize, total: usize },

    #[error("Cannot read log file '{path}': {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Alert evaluation failed: {0}")]
    Evaluation(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Interrupted before completion")]
    Interrupted,

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl MonitorError {
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 1    | Partial ingestion / general      |
    /// | 2    | Configuration error              |
    /// | 3    | Store unreachable                |
    /// | 10   | Log file cannot be opened / read |
    /// | 130  | Interrupted by a signal          |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Connection(_) => 3,
            Self::LogFile { .. } => 10,
            Self::Interrupted => 130,
            Self::PartialIngestion { .. }
            | Self::Evaluation(_)
            | Self::Export(_)
            | Self::Logging(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let config = MonitorError::Config(ConfigError::InvalidConfig("bad".to_string()));
        assert_eq!(config.exit_code(), 2);

        let partial = MonitorError::PartialIngestion {
            rejected: 3,
            total: 10,
        };
        assert_eq!(partial.exit_code(), 1);
        assert_eq!(
            partial.to_string(),
            "Ingestion incomplete: 3 of 10 records rejected"
        );

        let io = MonitorError::LogFile {
            path: "missing.log".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(io.exit_code(), 10);
        assert!(io.to_string().contains("missing.log"));
    }

    #[test]
    fn test_connection_error_is_one_line() {
        let err = MonitorError::Connection(StoreError::Unavailable {
            attempts: 3,
            last_error: "connection refused".to_string(),
        });
        assert_eq!(err.exit_code(), 3);
        assert!(!err.to_string().contains('\n'));
    }
}
