use super::error::{ParseError, ParseErrorReason};
use super::record::LogRecordParser;
use crate::domain::LogRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Records and rejected lines from one input source.
#[derive(Debug, Default, Clone)]
pub struct ParsedBatch {
    pub records: Vec<LogRecord>,
    pub errors: Vec<ParseError>,
}

impl ParsedBatch {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }

    pub fn rejected(&self) -> usize {
        self.errors.len()
    }
}

/// Parse every line of `reader`. Blank lines are skipped, malformed lines
/// (including ones that are not valid UTF-8) are collected into `errors` and
/// never abort the run. Only a failing read is returned as an error.
pub fn parse_reader<R: BufRead>(mut reader: R) -> std::io::Result<ParsedBatch> {
    let parser = LogRecordParser::new();
    let mut batch = ParsedBatch::default();
    let mut buf = Vec::new();
    let mut line_number = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(_) => {
                let raw = String::from_utf8_lossy(&buf);
                let e = ParseError::new(ParseErrorReason::InvalidEncoding, raw.trim())
                    .at_line(line_number);
                warn!("Could not parse line {}: {}", line_number, e.reason);
                batch.errors.push(e);
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match parser.parse(line) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                let e = e.at_line(line_number);
                warn!("Could not parse line {}: {}", line_number, e.reason);
                batch.errors.push(e);
            }
        }
    }

    info!(
        accepted = batch.accepted(),
        rejected = batch.rejected(),
        "Parsed log input"
    );

    Ok(batch)
}

/// Open and parse a log file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> std::io::Result<ParsedBatch> {
    let file = File::open(path.as_ref())?;
    parse_reader(BufReader::new(file))
}
