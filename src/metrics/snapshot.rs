use crate::domain::LogRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slack for `p * n` landing a hair above an integer (e.g. `0.07 * 100`)
const RANK_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Derived statistics for one set of records.
///
/// Latency fields are `None` when there are no records; they are never NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_count: usize,
    pub error_count: usize,
    /// `error_count / total_count`, 0 when there are no records
    pub error_rate: f64,
    pub avg_latency_ms: Option<f64>,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
    pub p50_latency_ms: Option<f64>,
    pub p95_latency_ms: Option<f64>,
    pub p99_latency_ms: Option<f64>,
    pub window: Option<TimeWindow>,
}

impl MetricsSnapshot {
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            error_count: 0,
            error_rate: 0.0,
            avg_latency_ms: None,
            min_latency_ms: None,
            max_latency_ms: None,
            p50_latency_ms: None,
            p95_latency_ms: None,
            p99_latency_ms: None,
            window: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// Compute a snapshot over `records`.
///
/// The result does not depend on the order of `records`: latencies are sorted
/// before any arithmetic, so even the floating point sum is reproducible.
pub fn aggregate(records: &[LogRecord]) -> MetricsSnapshot {
    if records.is_empty() {
        return MetricsSnapshot::empty();
    }

    let total_count = records.len();
    let error_count = records.iter().filter(|r| r.is_error()).count();

    let latencies = sorted_latencies(records);
    let sum: f64 = latencies.iter().sum();

    let start = records.iter().map(|r| r.timestamp).min();
    let end = records.iter().map(|r| r.timestamp).max();
    let window = start.zip(end).map(|(start, end)| TimeWindow { start, end });

    MetricsSnapshot {
        total_count,
        error_count,
        error_rate: error_count as f64 / total_count as f64,
        avg_latency_ms: Some(sum / total_count as f64),
        min_latency_ms: latencies.first().copied(),
        max_latency_ms: latencies.last().copied(),
        p50_latency_ms: percentile(&latencies, 0.50),
        p95_latency_ms: percentile(&latencies, 0.95),
        p99_latency_ms: percentile(&latencies, 0.99),
        window,
    }
}

/// Latency percentile of `records` (`p` in `[0, 1]`).
pub fn latency_percentile(records: &[LogRecord], p: f64) -> Option<f64> {
    percentile(&sorted_latencies(records), p)
}

/// Nearest-rank percentile over an ascending slice.
///
/// `rank = ceil(p * n)`, and the value at index `rank - 1` clamped to
/// `[0, n - 1]` is returned. For ten values 100..=1000, P95 is rank 10 (1000)
/// and P50 is rank 5 (500). Returns `None` for an empty slice or `p` outside
/// `[0, 1]`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let n = sorted.len();
    let rank = (p * n as f64 - RANK_TOLERANCE).ceil().max(1.0) as usize;
    let index = rank.saturating_sub(1).min(n - 1);

    sorted.get(index).copied()
}

fn sorted_latencies(records: &[LogRecord]) -> Vec<f64> {
    let mut latencies: Vec<f64> = records.iter().map(|r| r.latency_ms).collect();
    latencies.sort_by(f64::total_cmp);
    latencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Outcome;
    use chrono::TimeZone;

    fn record(latency_ms: f64, status_code: u16, second: u32) -> LogRecord {
        LogRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, second).unwrap(),
            transaction_id: format!("TXN{second}"),
            status_code,
            outcome: Outcome::classify(status_code, None),
            latency_ms,
            route: "/checkout".to_string(),
            message: None,
            user_id: None,
        }
    }

    #[test]
    fn test_empty_input() {
        let snapshot = aggregate(&[]);

        assert_eq!(snapshot.total_count, 0);
        assert_eq!(snapshot.error_rate, 0.0);
        assert_eq!(snapshot.avg_latency_ms, None);
        assert_eq!(snapshot.p95_latency_ms, None);
        assert_eq!(snapshot.window, None);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let latencies: Vec<f64> = (1..=10u32).map(|i| f64::from(i) * 100.0).collect();

        assert_eq!(percentile(&latencies, 0.95), Some(1000.0));
        assert_eq!(percentile(&latencies, 0.90), Some(900.0));
        assert_eq!(percentile(&latencies, 0.50), Some(500.0));
        assert_eq!(percentile(&latencies, 0.0), Some(100.0));
        assert_eq!(percentile(&latencies, 1.0), Some(1000.0));
        assert_eq!(percentile(&latencies, 1.5), None);
        assert_eq!(percentile(&[], 0.95), None);
    }

    #[test]
    fn test_rank_tolerance() {
        let latencies: Vec<f64> = (1..=100u32).map(f64::from).collect();
        // 0.07 * 100 is 7.000000000000001 in binary floating point
        assert_eq!(percentile(&latencies, 0.07), Some(7.0));
        assert_eq!(percentile(&latencies, 0.95), Some(95.0));
        assert_eq!(percentile(&latencies, 0.99), Some(99.0));
    }

    #[test]
    fn test_single_value() {
        assert_eq!(percentile(&[42.0], 0.95), Some(42.0));
        assert_eq!(percentile(&[42.0], 0.01), Some(42.0));
    }

    #[test]
    fn test_aggregate_counts_and_latency() {
        let records = vec![
            record(100.0, 200, 0),
            record(300.0, 500, 1),
            record(200.0, 404, 2),
            record(400.0, 200, 3),
        ];
        let snapshot = aggregate(&records);

        assert_eq!(snapshot.total_count, 4);
        assert_eq!(snapshot.error_count, 2);
        assert_eq!(snapshot.error_rate, 0.5);
        assert_eq!(snapshot.avg_latency_ms, Some(250.0));
        assert_eq!(snapshot.min_latency_ms, Some(100.0));
        assert_eq!(snapshot.max_latency_ms, Some(400.0));
        assert_eq!(snapshot.p95_latency_ms, Some(400.0));

        let window = snapshot.window.unwrap();
        assert_eq!(window.start, records[0].timestamp);
        assert_eq!(window.end, records[3].timestamp);
    }

    #[test]
    fn test_latency_percentile_of_records() {
        let records: Vec<LogRecord> = (1..=10u32)
            .map(|i| record(f64::from(i) * 100.0, 200, i))
            .collect();
        assert_eq!(latency_percentile(&records, 0.95), Some(1000.0));
    }
}
