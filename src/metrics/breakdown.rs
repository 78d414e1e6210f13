use super::snapshot::{MetricsSnapshot, aggregate};
use crate::domain::LogRecord;
use chrono::Timelike;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const TOP_USERS: usize = 10;

/// Distribution details reported next to the headline snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub routes: BTreeMap<String, MetricsSnapshot>,
    pub status_codes: BTreeMap<u16, usize>,
    pub errors_by_status: BTreeMap<u16, usize>,
    /// Hour of day (UTC) -> request count
    pub hourly: BTreeMap<u32, usize>,
    pub unique_users: usize,
    /// Most active users, by count descending then name
    pub top_users: Vec<(String, usize)>,
}

pub fn breakdown(records: &[LogRecord]) -> Breakdown {
    let mut by_route: BTreeMap<&str, Vec<LogRecord>> = BTreeMap::new();
    let mut status_codes = BTreeMap::new();
    let mut errors_by_status = BTreeMap::new();
    let mut hourly = BTreeMap::new();
    let mut users: HashMap<&str, usize> = HashMap::new();

    for record in records {
        by_route
            .entry(record.route.as_str())
            .or_default()
            .push(record.clone());
        *status_codes.entry(record.status_code).or_insert(0) += 1;
        if record.is_error() {
            *errors_by_status.entry(record.status_code).or_insert(0) += 1;
        }
        *hourly.entry(record.timestamp.hour()).or_insert(0) += 1;
        if let Some(user) = record.user_id.as_deref() {
            *users.entry(user).or_insert(0) += 1;
        }
    }

    let routes = by_route
        .into_iter()
        .map(|(route, records)| (route.to_string(), aggregate(&records)))
        .collect();

    let unique_users = users.len();
    let mut top_users: Vec<(String, usize)> = users
        .into_iter()
        .map(|(user, count)| (user.to_string(), count))
        .collect();
    top_users.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_users.truncate(TOP_USERS);

    Breakdown {
        routes,
        status_codes,
        errors_by_status,
        hourly,
        unique_users,
        top_users,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LogRecordParser;

    fn parse_all(lines: &[&str]) -> Vec<LogRecord> {
        let parser = LogRecordParser::new();
        lines.iter().map(|l| parser.parse(l).unwrap()).collect()
    }

    #[test]
    fn test_route_and_status_breakdown() {
        let records = parse_all(&[
            "2023-10-15 14:30:25 user-service 200 150ms user_123 TXN001 Login successful",
            "2023-10-15 14:31:10 payment-service 500 2500ms user_456 TXN002 Payment gateway timeout",
            "2023-10-15 15:02:44 payment-service 200 300ms user_123 TXN003 Payment processed",
            "2023-10-15 15:05:00 inventory-service 404 80ms user_789 TXN004 Item not found",
        ]);

        let result = breakdown(&records);

        assert_eq!(result.routes.len(), 3);
        let payment = &result.routes["payment-service"];
        assert_eq!(payment.total_count, 2);
        assert_eq!(payment.error_count, 1);
        assert_eq!(payment.avg_latency_ms, Some(1400.0));

        assert_eq!(result.status_codes[&200], 2);
        assert_eq!(result.errors_by_status[&500], 1);
        assert_eq!(result.errors_by_status[&404], 1);
        assert!(!result.errors_by_status.contains_key(&200));

        assert_eq!(result.hourly[&14], 2);
        assert_eq!(result.hourly[&15], 2);

        assert_eq!(result.unique_users, 3);
        assert_eq!(result.top_users[0], ("user_123".to_string(), 2));
        assert_eq!(result.top_users[1], ("user_456".to_string(), 1));
    }

    #[test]
    fn test_pipe_records_have_no_users() {
        let records = parse_all(&["2024-01-01T10:00:00|TXN1|200|10|/cart"]);
        let result = breakdown(&records);

        assert_eq!(result.unique_users, 0);
        assert!(result.top_users.is_empty());
    }
}
