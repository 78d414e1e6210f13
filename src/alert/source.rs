use crate::domain::LogRecord;
use crate::parser::parse_file;
use crate::store::{StoreClient, StoreError, WindowQuery};
use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Store query failed: {0}")]
    Store(#[from] StoreError),
    #[error("Cannot read '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where an evaluation cycle gets its records from.
pub trait MetricsSource: Send + Sync {
    fn describe(&self) -> String;
    fn fetch(&self) -> impl Future<Output = Result<Vec<LogRecord>, SourceError>> + Send;
}

/// Queries the store for the configured window. Owns the store connection,
/// which is released when the source is dropped.
pub struct StoreMetricsSource {
    store: StoreClient,
    query: WindowQuery,
}

impl StoreMetricsSource {
    pub fn new(store: StoreClient, query: WindowQuery) -> Self {
        Self { store, query }
    }

    pub fn query(&self) -> &WindowQuery {
        &self.query
    }
}

impl MetricsSource for StoreMetricsSource {
    fn describe(&self) -> String {
        if self.query.window_minutes == 0 {
            format!("{} ({}, all documents)", self.store.base_url(), self.query.index_pattern)
        } else {
            format!(
                "{} ({}, last {} min)",
                self.store.base_url(),
                self.query.index_pattern,
                self.query.window_minutes
            )
        }
    }

    async fn fetch(&self) -> Result<Vec<LogRecord>, SourceError> {
        Ok(self.query.fetch(&self.store, Utc::now()).await?)
    }
}

/// Re-parses a log file on every cycle.
pub struct FileMetricsSource {
    path: PathBuf,
}

impl FileMetricsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetricsSource for FileMetricsSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<LogRecord>, SourceError> {
        let batch = parse_file(&self.path).map_err(|source| SourceError::File {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(batch.records)
    }
}

/// A fixed set of records, evaluated as-is every cycle.
pub struct RecordsMetricsSource {
    records: Vec<LogRecord>,
}

impl RecordsMetricsSource {
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }
}

impl MetricsSource for RecordsMetricsSource {
    fn describe(&self) -> String {
        format!("{} supplied records", self.records.len())
    }

    async fn fetch(&self) -> Result<Vec<LogRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_reparses_each_fetch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2024-01-01T10:00:00|TXN1|200|120|/cart").unwrap();
        file.flush().unwrap();

        let source = FileMetricsSource::new(file.path());
        assert_eq!(source.fetch().await.unwrap().len(), 1);

        writeln!(file, "2024-01-01T10:00:01|TXN2|503|900|/cart").unwrap();
        file.flush().unwrap();
        assert_eq!(source.fetch().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_a_cycle_error() {
        let source = FileMetricsSource::new("/nonexistent/transactions.log");
        assert!(matches!(
            source.fetch().await,
            Err(SourceError::File { .. })
        ));
    }
}
