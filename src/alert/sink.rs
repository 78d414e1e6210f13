use std::sync::{Arc, Mutex};

#[cfg(test)]
use mockall::automock;

/// Destination of the evaluator's console lines.
#[cfg_attr(test, automock)]
pub trait ReportSink: Send {
    fn emit(&mut self, line: &str);
}

/// Prints to standard output.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn emit(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Collects lines in memory. Clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ReportSink for MemorySink {
    fn emit(&mut self, line: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}
