use proptest::prelude::*;
use rask_log_monitor::domain::Outcome;
use rask_log_monitor::parser::{LogRecordParser, ParseErrorReason, parse_file};
use rask_log_monitor::store::StoreDocument;

#[test]
fn test_documented_scenario_line() {
    let record = LogRecordParser::new()
        .parse("2024-01-01T10:00:00|TXN123|500|1200|/checkout")
        .unwrap();

    assert_eq!(record.status_code, 500);
    assert_eq!(record.outcome, Outcome::Error);
    assert_eq!(record.latency_ms, 1200.0);
    assert_eq!(record.route, "/checkout");
}

#[test]
fn test_demo_log() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/transactions.log");
    let batch = parse_file(path).unwrap();

    assert_eq!(batch.accepted(), 52);
    assert_eq!(batch.rejected(), 2);
    assert_eq!(batch.records.iter().filter(|r| r.is_error()).count(), 19);
}

#[test]
fn test_malformed_lines() {
    let parser = LogRecordParser::new();
    let cases = [
        (
            "2024-01-01T10:00:00|TXN1|200",
            ParseErrorReason::FieldCount {
                expected: 5,
                found: 3,
            },
        ),
        (
            "2024-01-01T10:00:00|TXN1|200|fast|/cart",
            ParseErrorReason::InvalidLatency("fast".to_string()),
        ),
        (
            "yesterday|TXN1|200|10|/cart",
            ParseErrorReason::InvalidTimestamp("yesterday".to_string()),
        ),
        ("2024-01-01T10:00:00|TXN1||10|/cart", ParseErrorReason::MissingStatus),
    ];

    for (line, reason) in cases {
        let err = parser.parse(line).unwrap_err();
        assert_eq!(err.reason, reason, "line: {line}");
        assert_eq!(err.raw_line, line);
    }
}

fn valid_line() -> impl Strategy<Value = (String, String, u16, u32, String)> {
    (
        (2000i32..2100, 1u32..13, 1u32..29, 0u32..24, 0u32..60, 0u32..60).prop_map(
            |(y, mo, d, h, mi, s)| format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}"),
        ),
        "[A-Z]{3}[0-9]{1,6}",
        100u16..600,
        0u32..1_000_000,
        "/[a-z]{1,12}(/[a-z0-9]{1,8}){0,2}",
    )
}

proptest! {
    #[test]
    fn prop_valid_lines_round_trip(
        (timestamp, txn, status, latency, route) in valid_line()
    ) {
        let line = format!("{timestamp}|{txn}|{status}|{latency}|{route}");
        let record = LogRecordParser::new().parse(&line).unwrap();

        prop_assert_eq!(record.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(), timestamp);
        prop_assert_eq!(&record.transaction_id, &txn);
        prop_assert_eq!(record.status_code, status);
        prop_assert_eq!(record.latency_ms, f64::from(latency));
        prop_assert_eq!(&record.route, &route);
        prop_assert_eq!(record.is_error(), status >= 400);

        let document = serde_json::to_value(StoreDocument::from(&record)).unwrap();
        prop_assert_eq!(document["transaction_id"].as_str(), Some(txn.as_str()));
        prop_assert_eq!(document["status_code"].as_u64(), Some(u64::from(status)));
        prop_assert_eq!(document["response_time_ms"].as_f64(), Some(f64::from(latency)));
        prop_assert_eq!(document["route"].as_str(), Some(route.as_str()));
    }

    #[test]
    fn prop_arbitrary_input_never_panics(line in ".{0,200}") {
        let _ = LogRecordParser::new().parse(&line);
    }
}
