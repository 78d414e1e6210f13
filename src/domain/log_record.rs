use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome class of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    /// Error iff the status is >= 400 or the message carries an explicit error marker.
    pub fn classify(status_code: u16, message: Option<&str>) -> Self {
        if status_code >= 400 || message.is_some_and(has_error_marker) {
            Outcome::Error
        } else {
            Outcome::Success
        }
    }

    pub fn is_error(self) -> bool {
        self == Outcome::Error
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }
}

fn has_error_marker(message: &str) -> bool {
    message
        .split_whitespace()
        .next()
        .map(|token| token.trim_end_matches(':'))
        .is_some_and(|token| token.eq_ignore_ascii_case("error"))
}

/// One parsed transaction event.
///
/// Records are produced by the parser, never mutated afterwards, and consumed
/// by the aggregator and the ingestion client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub transaction_id: String,
    pub status_code: u16,
    pub outcome: Outcome,
    pub latency_ms: f64,
    pub route: String,
    pub message: Option<String>,

    // Only present in the whitespace format
    pub user_id: Option<String>,
}

impl LogRecord {
    pub fn is_error(&self) -> bool {
        self.outcome.is_error()
    }
}
