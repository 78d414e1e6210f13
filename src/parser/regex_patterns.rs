// Lazily compiled static regex pattern sets
use super::regex_error::RegexError;
use regex::Regex;
use std::sync::OnceLock;

/// Static regex pattern set, compiled once on first access
pub struct StaticRegexSet {
    patterns: &'static [(&'static str, &'static str)], // (pattern, name)
    compiled: OnceLock<Result<Vec<Regex>, RegexError>>,
}

impl StaticRegexSet {
    pub const fn new(patterns: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            patterns,
            compiled: OnceLock::new(),
        }
    }

    pub fn get(&self, index: usize) -> Result<&Regex, RegexError> {
        let compiled = self.compiled.get_or_init(|| {
            self.patterns
                .iter()
                .map(|(pattern, name)| {
                    Regex::new(pattern).map_err(|e| RegexError::CompilationFailed {
                        pattern: (*pattern).to_string(),
                        name: (*name).to_string(),
                        source: e,
                    })
                })
                .collect()
        });

        match compiled {
            Ok(regexes) => regexes.get(index).ok_or(RegexError::IndexOutOfBounds {
                index,
                max: regexes.len(),
            }),
            Err(e) => Err(e.clone()),
        }
    }
}
