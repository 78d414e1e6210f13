use std::fmt;
use thiserror::Error;

/// Why a line was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorReason {
    #[error("empty line")]
    EmptyLine,

    #[error("line is not valid UTF-8")]
    InvalidEncoding,

    #[error("field count mismatch: expected at least {expected}, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("line does not match any known format")]
    UnrecognizedFormat,

    #[error("unparseable timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("status code missing")]
    MissingStatus,

    #[error("invalid status code '{0}'")]
    InvalidStatus(String),

    #[error("latency is not numeric: '{0}'")]
    InvalidLatency(String),

    #[error("latency is negative: {0}")]
    NegativeLatency(f64),

    #[error("{0} is empty")]
    EmptyField(&'static str),
}

/// A rejected input line together with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub reason: ParseErrorReason,
    pub raw_line: String,
    /// 1-based, filled in by the batch driver
    pub line_number: Option<usize>,
}

impl ParseError {
    pub fn new(reason: ParseErrorReason, raw_line: impl Into<String>) -> Self {
        Self {
            reason,
            raw_line: raw_line.into(),
            line_number: None,
        }
    }

    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "line {line}: {}: {}", self.reason, self.raw_line),
            None => write!(f, "{}: {}", self.reason, self.raw_line),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}
