//! Single-line transaction parser.
//!
//! Two layouts are accepted:
//!
//! - pipe-delimited: `timestamp|transaction_id|status|latency|route[|message]`
//! - whitespace (legacy e-commerce export):
//!   `YYYY-MM-DD HH:MM:SS service status latencyms user_id transaction_id info...`
//!
//! A line matching the legacy layout is read as legacy even when its trailing
//! info text contains `|`. Anything else with a `|` is read as pipe-delimited.
//! In the legacy layout the service name becomes the route.

use super::error::{ParseError, ParseErrorReason};
use super::generated::{VALIDATED_PATTERNS, get_pattern_name, pattern_index};
use crate::domain::{LogRecord, Outcome};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

/// Mandatory fields of the pipe-delimited layout
const PIPE_FIELDS: usize = 5;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Raw field slices before validation
struct RawFields<'a> {
    timestamp: &'a str,
    transaction_id: &'a str,
    status: &'a str,
    latency: &'a str,
    route: &'a str,
    message: Option<&'a str>,
    user_id: Option<&'a str>,
}

/// Stateless parser for one transaction log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRecordParser;

impl LogRecordParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse one line. Surrounding whitespace (including the newline) is trimmed.
    pub fn parse(&self, line: &str) -> Result<LogRecord, ParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(ParseError::new(ParseErrorReason::EmptyLine, trimmed));
        }

        let fields = match match_legacy(trimmed) {
            Some(fields) => fields,
            None if trimmed.contains('|') => {
                split_pipe(trimmed).map_err(|reason| ParseError::new(reason, trimmed))?
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorReason::UnrecognizedFormat,
                    trimmed,
                ));
            }
        };

        build_record(fields).map_err(|reason| ParseError::new(reason, trimmed))
    }
}

fn split_pipe(line: &str) -> Result<RawFields<'_>, ParseErrorReason> {
    // The message is the remainder and may itself contain '|'
    let parts: Vec<&str> = line.splitn(PIPE_FIELDS + 1, '|').map(str::trim).collect();

    if parts.len() < PIPE_FIELDS {
        return Err(ParseErrorReason::FieldCount {
            expected: PIPE_FIELDS,
            found: parts.len(),
        });
    }

    Ok(RawFields {
        timestamp: parts[0],
        transaction_id: parts[1],
        status: parts[2],
        latency: parts[3],
        route: parts[4],
        message: parts.get(5).copied(),
        user_id: None,
    })
}

fn pattern(index: usize) -> Option<&'static Regex> {
    match VALIDATED_PATTERNS.get(index) {
        Ok(regex) => Some(regex),
        Err(regex_error) => {
            tracing::debug!(
                pattern = get_pattern_name(index).unwrap_or("unknown"),
                "Pattern unavailable: {}",
                regex_error
            );
            None
        }
    }
}

fn match_legacy(line: &str) -> Option<RawFields<'_>> {
    let captures = pattern(pattern_index::LEGACY_TRANSACTION)?.captures(line)?;
    let group = |i: usize| captures.get(i).map_or("", |m| m.as_str());

    Some(RawFields {
        timestamp: group(1),
        route: group(2),
        status: group(3),
        latency: group(4),
        user_id: Some(group(5)),
        transaction_id: group(6),
        message: captures.get(7).map(|m| m.as_str()),
    })
}

fn build_record(fields: RawFields<'_>) -> Result<LogRecord, ParseErrorReason> {
    let timestamp = parse_timestamp(fields.timestamp)
        .ok_or_else(|| ParseErrorReason::InvalidTimestamp(fields.timestamp.to_string()))?;

    if fields.transaction_id.is_empty() {
        return Err(ParseErrorReason::EmptyField("transaction id"));
    }

    let status_code = parse_status(fields.status)?;
    let latency_ms = parse_latency(fields.latency)?;

    if fields.route.is_empty() {
        return Err(ParseErrorReason::EmptyField("route"));
    }

    let message = fields
        .message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let user_id = fields
        .user_id
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    Ok(LogRecord {
        timestamp,
        transaction_id: fields.transaction_id.to_string(),
        status_code,
        outcome: Outcome::classify(status_code, message.as_deref()),
        latency_ms,
        route: fields.route.to_string(),
        message,
        user_id,
    })
}

/// Parse an ISO 8601 style timestamp. Naive timestamps are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Some(regex) = pattern(pattern_index::ISO_TIMESTAMP)
        && !regex.is_match(text)
    {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

fn parse_status(text: &str) -> Result<u16, ParseErrorReason> {
    if text.is_empty() {
        return Err(ParseErrorReason::MissingStatus);
    }

    match text.parse::<u16>() {
        Ok(code) if (100..=599).contains(&code) => Ok(code),
        _ => Err(ParseErrorReason::InvalidStatus(text.to_string())),
    }
}

fn parse_latency(text: &str) -> Result<f64, ParseErrorReason> {
    let invalid = || ParseErrorReason::InvalidLatency(text.to_string());

    let well_formed = match pattern(pattern_index::LATENCY_MILLIS) {
        Some(regex) => regex.is_match(text),
        None => text
            .trim_end_matches("ms")
            .trim_start_matches(['+', '-'])
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.'),
    };
    if !well_formed {
        return Err(invalid());
    }

    let value: f64 = text
        .trim_end_matches("ms")
        .parse()
        .map_err(|_| invalid())?;

    if !value.is_finite() {
        return Err(invalid());
    }
    if value < 0.0 {
        return Err(ParseErrorReason::NegativeLatency(value));
    }

    // Normalizes -0.0
    Ok(value.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(line: &str) -> Result<LogRecord, ParseError> {
        LogRecordParser::new().parse(line)
    }

    #[test]
    fn test_pipe_line() {
        let record = parse("2024-01-01T10:00:00|TXN123|500|1200|/checkout").unwrap();

        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(record.transaction_id, "TXN123");
        assert_eq!(record.status_code, 500);
        assert_eq!(record.outcome, Outcome::Error);
        assert_eq!(record.latency_ms, 1200.0);
        assert_eq!(record.route, "/checkout");
        assert_eq!(record.message, None);
        assert_eq!(record.user_id, None);
    }

    #[test]
    fn test_pipe_line_with_message_containing_delimiter() {
        let record =
            parse("2024-01-01T10:00:00|TXN9|200|85ms|/cart|added sku=1|qty=2\n").unwrap();

        assert_eq!(record.latency_ms, 85.0);
        assert_eq!(record.message.as_deref(), Some("added sku=1|qty=2"));
        assert_eq!(record.outcome, Outcome::Success);
    }

    #[test]
    fn test_legacy_line() {
        let record = parse(
            "2023-10-15 14:30:25 payment-service 500 2500ms user_456 TXN002 Payment gateway timeout",
        )
        .unwrap();

        assert_eq!(record.route, "payment-service");
        assert_eq!(record.status_code, 500);
        assert_eq!(record.latency_ms, 2500.0);
        assert_eq!(record.user_id.as_deref(), Some("user_456"));
        assert_eq!(record.transaction_id, "TXN002");
        assert_eq!(record.message.as_deref(), Some("Payment gateway timeout"));
        assert!(record.is_error());
    }

    #[test]
    fn test_legacy_line_with_delimiter_in_info() {
        let record = parse(
            "2023-10-15 14:30:25 user-service 200 150ms user_123 TXN001 Login ok|via sso",
        )
        .unwrap();

        assert_eq!(record.route, "user-service");
        assert_eq!(record.transaction_id, "TXN001");
        assert_eq!(record.user_id.as_deref(), Some("user_123"));
        assert_eq!(record.message.as_deref(), Some("Login ok|via sso"));
        assert_eq!(record.outcome, Outcome::Success);
    }

    #[test]
    fn test_space_separated_timestamp_in_pipe_line() {
        let record = parse("2024-01-01 10:00:00|TXN7|201|15|/orders|created").unwrap();

        assert_eq!(record.transaction_id, "TXN7");
        assert_eq!(record.route, "/orders");
        assert_eq!(record.message.as_deref(), Some("created"));
    }

    #[test]
    fn test_error_marker_in_message() {
        let record = parse("2024-01-01T10:00:00|TXN5|200|40|/login|ERROR: token reused").unwrap();
        assert_eq!(record.outcome, Outcome::Error);
    }

    #[test]
    fn test_field_count_mismatch() {
        let err = parse("2024-01-01T10:00:00|TXN123|500").unwrap_err();
        assert_eq!(
            err.reason,
            ParseErrorReason::FieldCount {
                expected: 5,
                found: 3
            }
        );
        assert_eq!(err.raw_line, "2024-01-01T10:00:00|TXN123|500");
    }

    #[test]
    fn test_invalid_latency() {
        let err = parse("2024-01-01T10:00:00|TXN1|200|fast|/cart").unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::InvalidLatency("fast".to_string()));

        let err = parse("2024-01-01T10:00:00|TXN1|200|NaN|/cart").unwrap_err();
        assert!(matches!(err.reason, ParseErrorReason::InvalidLatency(_)));

        let err = parse("2024-01-01T10:00:00|TXN1|200|inf|/cart").unwrap_err();
        assert!(matches!(err.reason, ParseErrorReason::InvalidLatency(_)));
    }

    #[test]
    fn test_negative_latency() {
        let err = parse("2024-01-01T10:00:00|TXN1|200|-5|/cart").unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::NegativeLatency(-5.0));
    }

    #[test]
    fn test_invalid_timestamp() {
        let err = parse("2024-13-45T10:00:00|TXN1|200|10|/cart").unwrap_err();
        assert!(matches!(err.reason, ParseErrorReason::InvalidTimestamp(_)));

        let err = parse("yesterday|TXN1|200|10|/cart").unwrap_err();
        assert_eq!(
            err.reason,
            ParseErrorReason::InvalidTimestamp("yesterday".to_string())
        );
    }

    #[test]
    fn test_missing_and_invalid_status() {
        let err = parse("2024-01-01T10:00:00|TXN1||10|/cart").unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::MissingStatus);

        let err = parse("2024-01-01T10:00:00|TXN1|OK|10|/cart").unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::InvalidStatus("OK".to_string()));

        let err = parse("2024-01-01T10:00:00|TXN1|999|10|/cart").unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::InvalidStatus("999".to_string()));
    }

    #[test]
    fn test_empty_fields() {
        let err = parse("2024-01-01T10:00:00||200|10|/cart").unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::EmptyField("transaction id"));

        let err = parse("2024-01-01T10:00:00|TXN1|200|10|").unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::EmptyField("route"));
    }

    #[test]
    fn test_unrecognized_legacy_line() {
        let err = parse("this is not a transaction").unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::UnrecognizedFormat);
    }

    #[test]
    fn test_blank_line() {
        let err = parse("   \n").unwrap_err();
        assert_eq!(err.reason, ParseErrorReason::EmptyLine);
    }

    #[test]
    fn test_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T12:00:00+02:00"), Some(expected));
        assert!(parse_timestamp("2024-01-01T10:00:00.250").is_some());
        assert_eq!(parse_timestamp("2024-01-01"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
