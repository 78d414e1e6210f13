use super::groups::{CommandSettings, MonitorConfig};
use super::ConfigError;
use url::Url;

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate store URL
        let url = Url::parse(&self.store.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid store URL '{}': {}", self.store.url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Store URL '{}' must use http or https",
                self.store.url
            )));
        }

        if self.store.index_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Index prefix must not be empty".to_string(),
            ));
        }

        if self.store.request_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        match &self.command {
            CommandSettings::Parse(_) => Ok(()),
            CommandSettings::Ingest(ingest) => {
                if ingest.batch_size == 0 {
                    return Err(ConfigError::InvalidConfig(
                        "Batch size must be greater than 0".to_string(),
                    ));
                }
                if ingest.startup_retries == 0 {
                    return Err(ConfigError::InvalidConfig(
                        "Startup retries must be greater than 0".to_string(),
                    ));
                }
                if ingest.batch_attempts == 0 {
                    return Err(ConfigError::InvalidConfig(
                        "Batch attempts must be greater than 0".to_string(),
                    ));
                }
                if let Some(index) = &ingest.index
                    && index.trim().is_empty()
                {
                    return Err(ConfigError::InvalidConfig(
                        "Index name must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
            CommandSettings::Alert(alert) => {
                if alert.interval.is_zero() {
                    return Err(ConfigError::InvalidConfig(
                        "Alert interval must be greater than 0".to_string(),
                    ));
                }
                if alert.max_window_docs == 0 {
                    return Err(ConfigError::InvalidConfig(
                        "Max window documents must be greater than 0".to_string(),
                    ));
                }
                alert.thresholds.validate()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::groups::{AlertSettings, LoggingSettings, StoreSettings};
    use crate::app::config::{LogFormat, LogLevel};
    use crate::alert::{AlertThresholdConfig, Metric, ThresholdRule};
    use std::time::Duration;

    fn alert_config() -> MonitorConfig {
        MonitorConfig {
            store: StoreSettings {
                url: "http://localhost:9200".to_string(),
                index_prefix: "ecommerce-logs".to_string(),
                request_timeout: Duration::from_secs(30),
            },
            logging: LoggingSettings {
                level: LogLevel::Info,
                format: LogFormat::Text,
            },
            command: CommandSettings::Alert(AlertSettings {
                once: true,
                verbose: false,
                interval: Duration::from_secs(30),
                window_minutes: 60,
                max_window_docs: 10_000,
                source_file: None,
                thresholds: AlertThresholdConfig::default(),
            }),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(alert_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_store_url() {
        let mut config = alert_config();
        config.store.url = "localhost:9200".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        config.store.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_interval() {
        let mut config = alert_config();
        if let CommandSettings::Alert(alert) = &mut config.command {
            alert.interval = Duration::ZERO;
        }
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_thresholds_are_fatal() {
        let mut config = alert_config();
        if let CommandSettings::Alert(alert) = &mut config.command {
            alert.thresholds = AlertThresholdConfig {
                rules: vec![ThresholdRule::above(Metric::ErrorRate, 25.0)],
            };
        }
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConfig(_))));
    }
}
