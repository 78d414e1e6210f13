//! Transaction log parsing.
//!
//! `LogRecordParser` turns one line into a [`LogRecord`](crate::domain::LogRecord);
//! the batch driver applies it to a whole file and partitions the results.

pub mod batch;
pub mod error;
pub mod generated;
pub mod record;
pub mod regex_error;
pub mod regex_patterns;

pub use batch::{ParsedBatch, parse_file, parse_reader};
pub use error::{ParseError, ParseErrorReason};
pub use record::{LogRecordParser, parse_timestamp};
pub use regex_error::RegexError;
