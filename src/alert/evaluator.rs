use super::sink::ReportSink;
use super::source::{MetricsSource, SourceError};
use super::thresholds::{AlertThresholdConfig, Comparison, Metric, RuleCheck, Severity};
use crate::domain::LogRecord;
use crate::metrics::{MetricsSnapshot, aggregate, breakdown};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One breached threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub severity: Severity,
    pub metric: Metric,
    pub op: Comparison,
    pub observed: f64,
    pub threshold: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: observed {} {} threshold {}",
            self.severity.label(),
            self.metric,
            self.metric.format_value(self.observed),
            self.op.symbol(),
            self.metric.format_value(self.threshold)
        )
    }
}

/// Alerts for every rule `snapshot` breaches, in rule order.
pub fn evaluate(thresholds: &AlertThresholdConfig, snapshot: &MetricsSnapshot) -> Vec<Alert> {
    thresholds
        .rules
        .iter()
        .filter_map(|rule| match rule.check(snapshot) {
            RuleCheck::Breached {
                severity,
                observed,
                threshold,
            } => Some(Alert {
                severity,
                metric: rule.metric,
                op: rule.op,
                observed,
                threshold,
            }),
            RuleCheck::Within { .. } | RuleCheck::NoData => None,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorState {
    Idle,
    Querying,
    Evaluating,
    WarningEmitted,
    Ok,
    Sleeping,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub snapshot: MetricsSnapshot,
    pub alerts: Vec<Alert>,
}

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub alerts: u64,
    pub last_error: Option<String>,
}

/// Periodically derives metrics from a source and checks them against the
/// threshold rules.
pub struct AlertEvaluator<S, K> {
    source: S,
    sink: K,
    thresholds: AlertThresholdConfig,
    verbose: bool,
    state: EvaluatorState,
}

impl<S: MetricsSource, K: ReportSink> AlertEvaluator<S, K> {
    pub fn new(source: S, sink: K, thresholds: AlertThresholdConfig) -> Self {
        Self {
            source,
            sink,
            thresholds,
            verbose: false,
            state: EvaluatorState::Idle,
        }
    }

    /// Also print the metric summary and a line per rule within threshold.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn state(&self) -> EvaluatorState {
        self.state
    }

    fn transition(&mut self, next: EvaluatorState) {
        debug!("Evaluator state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Fetch, aggregate, compare and print once.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, SourceError> {
        self.transition(EvaluatorState::Querying);
        let records = self.source.fetch().await?;

        self.transition(EvaluatorState::Evaluating);
        let snapshot = aggregate(&records);
        let alerts = evaluate(&self.thresholds, &snapshot);

        if self.verbose {
            self.emit_summary(&records, &snapshot);
        }
        for alert in &alerts {
            self.sink.emit(&alert.to_string());
        }
        if self.verbose {
            self.emit_within(&snapshot);
        }

        if alerts.is_empty() {
            self.transition(EvaluatorState::Ok);
        } else {
            self.transition(EvaluatorState::WarningEmitted);
        }

        Ok(CycleReport { snapshot, alerts })
    }

    /// Run cycles every `interval` until `cancel` fires, or a single cycle
    /// when `once` is set. A failed cycle is logged and the loop continues.
    ///
    /// Consumes the evaluator so the source, and any connection it holds, is
    /// dropped on return.
    pub async fn run(
        mut self,
        interval: Duration,
        once: bool,
        cancel: CancellationToken,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(
            "Evaluating {} rule(s) against {}",
            self.thresholds.rules.len(),
            self.source.describe()
        );

        loop {
            let outcome = tokio::select! {
                () = cancel.cancelled() => break,
                outcome = self.run_cycle() => outcome,
            };

            summary.cycles += 1;
            match outcome {
                Ok(report) => summary.alerts += report.alerts.len() as u64,
                Err(e) => {
                    summary.failed_cycles += 1;
                    warn!("Evaluation cycle {} failed: {}", summary.cycles, e);
                    summary.last_error = Some(e.to_string());
                }
            }

            if once {
                break;
            }

            self.transition(EvaluatorState::Sleeping);
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        self.transition(EvaluatorState::Stopped);
        info!(
            cycles = summary.cycles,
            failed = summary.failed_cycles,
            alerts = summary.alerts,
            "Alert evaluator stopped"
        );
        summary
    }

    fn emit_summary(&mut self, records: &[LogRecord], snapshot: &MetricsSnapshot) {
        let ms = |value: Option<f64>| value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}ms"));

        self.sink.emit(&format!("Total Requests: {}", snapshot.total_count));
        self.sink.emit(&format!("Error Count: {}", snapshot.error_count));
        self.sink.emit(&format!("Error Rate: {:.2}%", snapshot.error_rate * 100.0));
        self.sink.emit(&format!("Avg Response Time: {}", ms(snapshot.avg_latency_ms)));
        self.sink.emit(&format!("P95 Response Time: {}", ms(snapshot.p95_latency_ms)));
        self.sink.emit(&format!("P99 Response Time: {}", ms(snapshot.p99_latency_ms)));

        let details = breakdown(records);
        for (status, count) in &details.status_codes {
            self.sink.emit(&format!("  {status}: {count}"));
        }
    }

    fn emit_within(&mut self, snapshot: &MetricsSnapshot) {
        for rule in &self.thresholds.rules {
            let line = match rule.check(snapshot) {
                RuleCheck::Within { observed } => format!(
                    "[OK] {}: observed {} {} threshold {} (within threshold)",
                    rule.metric,
                    rule.metric.format_value(observed),
                    rule.op.inverse_symbol(),
                    rule.metric.format_value(rule.threshold)
                ),
                RuleCheck::NoData => format!("[OK] {}: no data in window", rule.metric),
                RuleCheck::Breached { .. } => continue,
            };
            self.sink.emit(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::sink::MockReportSink;
    use crate::alert::source::RecordsMetricsSource;
    use crate::alert::thresholds::ThresholdRule;
    use crate::parser::LogRecordParser;
    use mockall::predicate::eq;

    fn records(errors: usize, total: usize) -> Vec<LogRecord> {
        let parser = LogRecordParser::new();
        (0..total)
            .map(|i| {
                let status = if i < errors { 500 } else { 200 };
                parser
                    .parse(&format!("2024-01-01T10:00:{:02}|TXN{i}|{status}|120|/checkout", i % 60))
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_alert_line_format() {
        let alert = Alert {
            severity: Severity::Warning,
            metric: Metric::ErrorRate,
            op: Comparison::GreaterThan,
            observed: 19.0 / 52.0,
            threshold: 0.25,
        };
        assert_eq!(
            alert.to_string(),
            "[WARNING] error_rate: observed 0.3654 > threshold 0.2500"
        );
    }

    #[test]
    fn test_evaluate_in_rule_order() {
        let snapshot = aggregate(&records(19, 52));
        let alerts = evaluate(&AlertThresholdConfig::default(), &snapshot);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, Metric::ErrorRate);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_cycle_emits_exactly_one_warning() {
        let mut sink = MockReportSink::new();
        sink.expect_emit()
            .with(eq("[WARNING] error_rate: observed 0.3654 > threshold 0.2500"))
            .times(1)
            .return_const(());

        let mut evaluator = AlertEvaluator::new(
            RecordsMetricsSource::new(records(19, 52)),
            sink,
            AlertThresholdConfig::default(),
        );

        let report = evaluator.run_cycle().await.unwrap();
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(evaluator.state(), EvaluatorState::WarningEmitted);
    }

    #[tokio::test]
    async fn test_quiet_cycle_prints_nothing() {
        let mut sink = MockReportSink::new();
        sink.expect_emit().times(0);

        let mut evaluator = AlertEvaluator::new(
            RecordsMetricsSource::new(records(1, 52)),
            sink,
            AlertThresholdConfig::default(),
        );

        let report = evaluator.run_cycle().await.unwrap();
        assert!(report.alerts.is_empty());
        assert_eq!(evaluator.state(), EvaluatorState::Ok);
    }

    #[tokio::test]
    async fn test_verbose_cycle_reports_rules_within_threshold() {
        let sink = crate::alert::MemorySink::new();
        let thresholds = AlertThresholdConfig {
            rules: vec![ThresholdRule::above(Metric::P95LatencyMs, 1000.0)],
        };

        let mut evaluator =
            AlertEvaluator::new(RecordsMetricsSource::new(records(0, 10)), sink.clone(), thresholds)
                .verbose(true);
        evaluator.run_cycle().await.unwrap();

        let lines = sink.lines();
        assert!(lines.contains(&"Total Requests: 10".to_string()));
        assert!(lines.contains(&"  200: 10".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "[OK] p95_latency_ms: observed 120.00 <= threshold 1000.00 (within threshold)"
        );
    }

    #[tokio::test]
    async fn test_run_once_stops() {
        let evaluator = AlertEvaluator::new(
            RecordsMetricsSource::new(records(19, 52)),
            crate::alert::MemorySink::new(),
            AlertThresholdConfig::default(),
        );

        let summary = evaluator
            .run(Duration::from_secs(3600), true, CancellationToken::new())
            .await;
        assert_eq!(
            summary,
            RunSummary {
                cycles: 1,
                failed_cycles: 0,
                alerts: 1,
                last_error: None,
            }
        );
    }
}
