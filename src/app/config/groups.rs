use super::cli::{AlertArgs, Cli, Commands, GlobalArgs, IngestArgs, ParseArgs};
use super::{ConfigError, LogFormat, LogLevel};
use crate::alert::{AlertThresholdConfig, Metric, ThresholdRule};
use crate::store::{DEFAULT_INDEX_PREFIX, DEFAULT_MAX_WINDOW_DOCS, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STORE_URL: &str = "http://localhost:9200";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_STARTUP_RETRIES: u32 = 30;
pub const DEFAULT_STARTUP_RETRY_DELAY_SECS: u64 = 5;
pub const DEFAULT_BATCH_ATTEMPTS: u32 = 1;
pub const DEFAULT_ALERT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_ALERT_WINDOW_MINUTES: u64 = 60;

/// Contents of the `--config` TOML file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub store: StoreSection,
    pub logging: LoggingSection,
    pub ingest: IngestSection,
    pub alert: AlertSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub url: Option<String>,
    pub index_prefix: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<LogLevel>,
    pub format: Option<LogFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestSection {
    pub batch_size: Option<usize>,
    pub startup_retries: Option<u32>,
    pub startup_retry_delay_secs: Option<u64>,
    pub batch_attempts: Option<u32>,
    pub compress: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertSection {
    pub interval_secs: Option<u64>,
    pub window_minutes: Option<u64>,
    pub max_window_docs: Option<usize>,
    pub thresholds_file: Option<PathBuf>,
    pub error_rate_threshold: Option<f64>,
    pub p95_latency_threshold_ms: Option<f64>,
    pub rules: Option<Vec<ThresholdRule>>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub url: String,
    pub index_prefix: String,
    pub request_timeout: Duration,
}

impl StoreSettings {
    pub fn client_config(&self, enable_compression: bool) -> StoreConfig {
        StoreConfig {
            url: self.url.clone(),
            timeout: self.request_timeout,
            enable_compression,
            ..StoreConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseSettings {
    pub logfile: PathBuf,
    pub output: Option<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestSettings {
    pub logfile: PathBuf,
    pub batch_size: usize,
    pub index: Option<String>,
    pub startup_retries: u32,
    pub startup_retry_delay: Duration,
    pub batch_attempts: u32,
    pub compress: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertSettings {
    pub once: bool,
    pub verbose: bool,
    pub interval: Duration,
    pub window_minutes: u64,
    pub max_window_docs: usize,
    pub source_file: Option<PathBuf>,
    pub thresholds: AlertThresholdConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandSettings {
    Parse(ParseSettings),
    Ingest(IngestSettings),
    Alert(AlertSettings),
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub store: StoreSettings,
    pub logging: LoggingSettings,
    pub command: CommandSettings,
}

impl MonitorConfig {
    /// Layer CLI flags (clap already folded in environment variables) over
    /// the config file and the defaults, then validate.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.global.config_file {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        let config = Self::merge(cli, &file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn merge(cli: &Cli, file: &FileConfig) -> Result<Self, ConfigError> {
        let command = match &cli.command {
            Commands::Parse(args) => CommandSettings::Parse(parse_settings(args)),
            Commands::Ingest(args) => CommandSettings::Ingest(ingest_settings(args, &file.ingest)),
            Commands::Alert(args) => CommandSettings::Alert(alert_settings(args, &file.alert)?),
        };

        Ok(Self {
            store: store_settings(&cli.global, &file.store),
            logging: logging_settings(&cli.global, &file.logging),
            command,
        })
    }
}

fn store_settings(args: &GlobalArgs, file: &StoreSection) -> StoreSettings {
    StoreSettings {
        url: layered(args.store_url.clone(), file.url.clone(), DEFAULT_STORE_URL.to_string()),
        index_prefix: layered(
            args.index_prefix.clone(),
            file.index_prefix.clone(),
            DEFAULT_INDEX_PREFIX.to_string(),
        ),
        request_timeout: Duration::from_secs(layered(
            args.request_timeout_secs,
            file.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )),
    }
}

fn logging_settings(args: &GlobalArgs, file: &LoggingSection) -> LoggingSettings {
    LoggingSettings {
        level: layered(args.log_level, file.level, LogLevel::default()),
        format: layered(args.log_format, file.format, LogFormat::default()),
    }
}

fn parse_settings(args: &ParseArgs) -> ParseSettings {
    ParseSettings {
        logfile: args.logfile.clone(),
        output: args.output.clone(),
        json: args.json,
    }
}

fn ingest_settings(args: &IngestArgs, file: &IngestSection) -> IngestSettings {
    IngestSettings {
        logfile: args.logfile.clone(),
        batch_size: layered(args.batch_size, file.batch_size, DEFAULT_BATCH_SIZE),
        index: args.index.clone(),
        startup_retries: layered(args.startup_retries, file.startup_retries, DEFAULT_STARTUP_RETRIES),
        startup_retry_delay: Duration::from_secs(layered(
            args.startup_retry_delay_secs,
            file.startup_retry_delay_secs,
            DEFAULT_STARTUP_RETRY_DELAY_SECS,
        )),
        batch_attempts: layered(args.batch_attempts, file.batch_attempts, DEFAULT_BATCH_ATTEMPTS),
        compress: args.compress || file.compress.unwrap_or(false),
    }
}

fn alert_settings(args: &AlertArgs, file: &AlertSection) -> Result<AlertSettings, ConfigError> {
    let thresholds_file = args
        .thresholds_file
        .as_ref()
        .or(file.thresholds_file.as_ref());

    let mut thresholds = match (thresholds_file, &file.rules) {
        (Some(path), _) => AlertThresholdConfig::load(path)?,
        (None, Some(rules)) => AlertThresholdConfig {
            rules: rules.clone(),
        },
        (None, None) => AlertThresholdConfig::default(),
    };

    if let Some(threshold) = args.error_rate_threshold.or(file.error_rate_threshold) {
        thresholds.override_threshold(Metric::ErrorRate, threshold);
    }
    if let Some(threshold) = args
        .p95_latency_threshold_ms
        .or(file.p95_latency_threshold_ms)
    {
        thresholds.override_threshold(Metric::P95LatencyMs, threshold);
    }

    Ok(AlertSettings {
        once: args.once,
        verbose: args.verbose,
        interval: Duration::from_secs(layered(
            args.interval_secs,
            file.interval_secs,
            DEFAULT_ALERT_INTERVAL_SECS,
        )),
        window_minutes: layered(
            args.window_minutes,
            file.window_minutes,
            DEFAULT_ALERT_WINDOW_MINUTES,
        ),
        max_window_docs: layered(args.max_window_docs, file.max_window_docs, DEFAULT_MAX_WINDOW_DOCS),
        source_file: args.source_file.clone(),
        thresholds,
    })
}

fn layered<T>(flag: Option<T>, file: Option<T>, default: T) -> T {
    flag.or(file).unwrap_or(default)
}
