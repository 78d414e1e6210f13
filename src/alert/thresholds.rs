use crate::app::config::ConfigError;
use crate::metrics::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 0.25;
pub const DEFAULT_ERROR_RATE_CRITICAL: f64 = 0.5;
pub const DEFAULT_P95_LATENCY_THRESHOLD_MS: f64 = 1000.0;
pub const DEFAULT_P95_LATENCY_CRITICAL_MS: f64 = 2000.0;
pub const DEFAULT_ERROR_COUNT_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ErrorRate,
    ErrorCount,
    AvgLatencyMs,
    P95LatencyMs,
    P99LatencyMs,
    TotalCount,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::ErrorRate => "error_rate",
            Metric::ErrorCount => "error_count",
            Metric::AvgLatencyMs => "avg_latency_ms",
            Metric::P95LatencyMs => "p95_latency_ms",
            Metric::P99LatencyMs => "p99_latency_ms",
            Metric::TotalCount => "total_count",
        }
    }

    /// Observed value, `None` when the snapshot has nothing to report (latency
    /// over an empty window).
    pub fn value(self, snapshot: &MetricsSnapshot) -> Option<f64> {
        match self {
            Metric::ErrorRate => Some(snapshot.error_rate),
            Metric::ErrorCount => Some(snapshot.error_count as f64),
            Metric::TotalCount => Some(snapshot.total_count as f64),
            Metric::AvgLatencyMs => snapshot.avg_latency_ms,
            Metric::P95LatencyMs => snapshot.p95_latency_ms,
            Metric::P99LatencyMs => snapshot.p99_latency_ms,
        }
    }

    fn is_fraction(self) -> bool {
        self == Metric::ErrorRate
    }

    fn is_count(self) -> bool {
        matches!(self, Metric::ErrorCount | Metric::TotalCount)
    }

    /// Render a value of this metric for a console line.
    pub fn format_value(self, value: f64) -> String {
        if self.is_fraction() {
            format!("{value:.4}")
        } else if self.is_count() {
            format!("{value:.0}")
        } else {
            format!("{value:.2}")
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::GreaterThan => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::LessThan => "<",
            Comparison::LessOrEqual => "<=",
        }
    }

    /// Negation, used for "within threshold" lines.
    pub fn inverse_symbol(self) -> &'static str {
        match self {
            Comparison::GreaterThan => "<=",
            Comparison::GreaterOrEqual => "<",
            Comparison::LessThan => ">=",
            Comparison::LessOrEqual => ">",
        }
    }

    pub fn breached(self, observed: f64, threshold: f64) -> bool {
        match self {
            Comparison::GreaterThan => observed > threshold,
            Comparison::GreaterOrEqual => observed >= threshold,
            Comparison::LessThan => observed < threshold,
            Comparison::LessOrEqual => observed <= threshold,
        }
    }

    fn points_up(self) -> bool {
        matches!(self, Comparison::GreaterThan | Comparison::GreaterOrEqual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Warning,
    Critical,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// One comparison of a metric against a fixed value.
///
/// When `critical` is set and also breached, the single alert for the rule is
/// raised at critical severity instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub metric: Metric,
    pub op: Comparison,
    pub threshold: f64,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<f64>,
}

/// Outcome of checking one rule against a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheck {
    Breached {
        severity: Severity,
        observed: f64,
        threshold: f64,
    },
    Within {
        observed: f64,
    },
    NoData,
}

impl ThresholdRule {
    pub fn above(metric: Metric, threshold: f64) -> Self {
        Self {
            metric,
            op: Comparison::GreaterThan,
            threshold,
            severity: Severity::Warning,
            critical: None,
        }
    }

    pub fn with_critical(mut self, critical: f64) -> Self {
        self.critical = Some(critical);
        self
    }

    pub fn check(&self, snapshot: &MetricsSnapshot) -> RuleCheck {
        let Some(observed) = self.metric.value(snapshot) else {
            return RuleCheck::NoData;
        };

        if let Some(critical) = self.critical
            && self.op.breached(observed, critical)
        {
            return RuleCheck::Breached {
                severity: Severity::Critical,
                observed,
                threshold: critical,
            };
        }

        if self.op.breached(observed, self.threshold) {
            RuleCheck::Breached {
                severity: self.severity,
                observed,
                threshold: self.threshold,
            }
        } else {
            RuleCheck::Within { observed }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.metric.name();
        if !self.threshold.is_finite() {
            return Err(ConfigError::InvalidConfig(format!(
                "Threshold for {name} must be a finite number"
            )));
        }
        if self.metric.is_fraction() && !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidConfig(format!(
                "Threshold for {name} must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if let Some(critical) = self.critical {
            if !critical.is_finite() {
                return Err(ConfigError::InvalidConfig(format!(
                    "Critical threshold for {name} must be a finite number"
                )));
            }
            if self.metric.is_fraction() && !(0.0..=1.0).contains(&critical) {
                return Err(ConfigError::InvalidConfig(format!(
                    "Critical threshold for {name} must be within [0, 1], got {critical}"
                )));
            }
            let escalates = if self.op.points_up() {
                critical >= self.threshold
            } else {
                critical <= self.threshold
            };
            if !escalates {
                return Err(ConfigError::InvalidConfig(format!(
                    "Critical threshold {critical} for {name} must lie beyond the warning threshold {}",
                    self.threshold
                )));
            }
        }
        Ok(())
    }
}

/// Threshold rules for a run. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholdConfig {
    pub rules: Vec<ThresholdRule>,
}

impl Default for AlertThresholdConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                ThresholdRule::above(Metric::ErrorRate, DEFAULT_ERROR_RATE_THRESHOLD)
                    .with_critical(DEFAULT_ERROR_RATE_CRITICAL),
                ThresholdRule::above(Metric::P95LatencyMs, DEFAULT_P95_LATENCY_THRESHOLD_MS)
                    .with_critical(DEFAULT_P95_LATENCY_CRITICAL_MS),
                ThresholdRule::above(Metric::ErrorCount, DEFAULT_ERROR_COUNT_THRESHOLD),
            ],
        }
    }
}

impl AlertThresholdConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::InvalidConfig(format!(
                "Cannot read thresholds file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&text)
    }

    /// Replace the warning threshold of every rule on `metric`, adding a rule
    /// when none exists.
    pub fn override_threshold(&mut self, metric: Metric, threshold: f64) {
        let mut found = false;
        for rule in self.rules.iter_mut().filter(|r| r.metric == metric) {
            rule.threshold = threshold;
            // A critical level below the new warning level would never escalate
            if rule.critical.is_some_and(|c| !rule.op.breached(c, threshold) && c != threshold) {
                rule.critical = None;
            }
            found = true;
        }
        if !found {
            self.rules.push(ThresholdRule::above(metric, threshold));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "At least one threshold rule is required".to_string(),
            ));
        }
        self.rules.iter().try_for_each(ThresholdRule::validate)
    }
}
