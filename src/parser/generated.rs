// Include build-time validated regex patterns
include!(concat!(env!("OUT_DIR"), "/validated_regexes.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_index_constants() {
        assert_eq!(
            get_pattern_name(pattern_index::LEGACY_TRANSACTION),
            Some("legacy_transaction")
        );
        assert_eq!(
            get_pattern_name(pattern_index::ISO_TIMESTAMP),
            Some("iso_timestamp")
        );
        assert_eq!(
            get_pattern_name(pattern_index::LATENCY_MILLIS),
            Some("latency_millis")
        );
        assert_eq!(get_pattern_name(99), None);
    }

    #[test]
    fn test_pattern_compilation() {
        for i in [
            pattern_index::LEGACY_TRANSACTION,
            pattern_index::ISO_TIMESTAMP,
            pattern_index::LATENCY_MILLIS,
        ] {
            assert!(
                VALIDATED_PATTERNS.get(i).is_ok(),
                "Pattern at index {i} should compile successfully"
            );
        }
    }
}
