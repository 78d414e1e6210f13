use super::{LogFormat, LogLevel};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parse, ingest and watch transaction logs.
///
/// Every option falls back to its environment variable, then to the TOML
/// file given by `--config`, then to the built-in default.
#[derive(Parser, Debug, Clone)]
#[command(name = "rask-log-monitor", author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// TOML configuration file
    #[arg(long = "config", global = true, env = "MONITOR_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Document store base URL [default: http://localhost:9200]
    #[arg(long, global = true, env = "STORE_URL")]
    pub store_url: Option<String>,

    /// Prefix of the daily indices [default: ecommerce-logs]
    #[arg(long, global = true, env = "INDEX_PREFIX")]
    pub index_prefix: Option<String>,

    /// Store request timeout in seconds [default: 30]
    #[arg(long, global = true, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Log level [default: info]
    #[arg(long, global = true, env = "LOG_LEVEL", ignore_case = true)]
    pub log_level: Option<LogLevel>,

    /// Log output format [default: text]
    #[arg(long, global = true, env = "RUST_LOG_FORMAT", ignore_case = true)]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Parse a log file and print summary statistics
    Parse(ParseArgs),
    /// Parse a log file and load the records into the store
    Ingest(IngestArgs),
    /// Check metrics against alert thresholds
    Alert(AlertArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Transaction log to read
    pub logfile: PathBuf,

    /// Write metadata, metrics and records as JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Transaction log to read
    pub logfile: PathBuf,

    /// Documents per bulk request [default: 500]
    #[arg(long, env = "BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Target index [default: <index-prefix>-YYYY.MM.DD]
    #[arg(long)]
    pub index: Option<String>,

    /// Health checks before giving up on the store [default: 30]
    #[arg(long, env = "STARTUP_RETRIES")]
    pub startup_retries: Option<u32>,

    /// Seconds between health checks [default: 5]
    #[arg(long, env = "STARTUP_RETRY_DELAY_SECS")]
    pub startup_retry_delay_secs: Option<u64>,

    /// Attempts per bulk request on transient failures [default: 1]
    #[arg(long, env = "BATCH_ATTEMPTS")]
    pub batch_attempts: Option<u32>,

    /// Gzip bulk requests larger than 100 documents
    #[arg(long, env = "ENABLE_COMPRESSION")]
    pub compress: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AlertArgs {
    /// Run a single evaluation cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Print the metric summary and rules within threshold
    #[arg(long, short)]
    pub verbose: bool,

    /// Seconds between cycles [default: 30]
    #[arg(long, env = "ALERT_INTERVAL_SECS")]
    pub interval_secs: Option<u64>,

    /// Minutes of history per cycle, 0 for the whole index [default: 60]
    #[arg(long, env = "ALERT_WINDOW_MINUTES")]
    pub window_minutes: Option<u64>,

    /// Upper bound on documents fetched per cycle [default: 10000]
    #[arg(long, env = "MAX_WINDOW_DOCS")]
    pub max_window_docs: Option<usize>,

    /// Evaluate this log file instead of querying the store
    #[arg(long)]
    pub source_file: Option<PathBuf>,

    /// TOML file with [[rules]] replacing the default thresholds
    #[arg(long, env = "THRESHOLDS_FILE")]
    pub thresholds_file: Option<PathBuf>,

    /// Warning threshold for the error rate, a fraction in [0, 1]
    #[arg(long, env = "ERROR_RATE_THRESHOLD")]
    pub error_rate_threshold: Option<f64>,

    /// Warning threshold for P95 latency in milliseconds
    #[arg(long, env = "P95_LATENCY_THRESHOLD_MS")]
    pub p95_latency_threshold_ms: Option<f64>,
}
