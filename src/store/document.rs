use crate::domain::{LogRecord, Outcome};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A record as stored in the index.
///
/// `@timestamp` is RFC 3339 in UTC so the store can range-filter and sort on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    pub transaction_id: String,
    pub status_code: u16,
    pub response_time_ms: f64,
    pub route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub is_error: bool,
    pub outcome: Outcome,
}

impl From<&LogRecord> for StoreDocument {
    fn from(record: &LogRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            transaction_id: record.transaction_id.clone(),
            status_code: record.status_code,
            response_time_ms: record.latency_ms,
            route: record.route.clone(),
            message: record.message.clone(),
            user_id: record.user_id.clone(),
            is_error: record.is_error(),
            outcome: record.outcome,
        }
    }
}

impl From<StoreDocument> for LogRecord {
    fn from(doc: StoreDocument) -> Self {
        Self {
            timestamp: doc.timestamp,
            transaction_id: doc.transaction_id,
            status_code: doc.status_code,
            outcome: doc.outcome,
            latency_ms: doc.response_time_ms,
            route: doc.route,
            message: doc.message,
            user_id: doc.user_id,
        }
    }
}

/// Stable `_id` for a record: transaction id plus millisecond timestamp.
///
/// Re-ingesting the same input overwrites instead of duplicating.
pub fn document_id(record: &LogRecord) -> String {
    format!(
        "{}@{}",
        record.transaction_id,
        record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}
