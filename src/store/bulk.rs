use super::document::{StoreDocument, document_id};
use super::error::StoreError;
use crate::domain::LogRecord;
use flate2::{Compression, write::GzEncoder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

/// Bytes reserved per document when sizing the output buffer
const ESTIMATED_ENTRY_SIZE: usize = 320;
const MAX_SAFE_BUFFER_SIZE: usize = 100 * 1024 * 1024; // 100MB

#[derive(Serialize)]
struct BulkAction<'a> {
    index: BulkTarget<'a>,
}

#[derive(Serialize)]
struct BulkTarget<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_id")]
    id: String,
}

/// Builds bulk request bodies: one action line and one document line per record.
#[derive(Debug, Clone, Default)]
pub struct BulkSerializer;

impl BulkSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize_ndjson(&self, index: &str, records: &[LogRecord]) -> Result<Vec<u8>, StoreError> {
        let capacity = records
            .len()
            .saturating_mul(ESTIMATED_ENTRY_SIZE)
            .min(MAX_SAFE_BUFFER_SIZE);
        let mut buffer = Vec::with_capacity(capacity);

        for record in records {
            let action = BulkAction {
                index: BulkTarget {
                    index,
                    id: document_id(record),
                },
            };
            serde_json::to_writer(&mut buffer, &action)?;
            buffer.write_all(b"\n")?;
            serde_json::to_writer(&mut buffer, &StoreDocument::from(record))?;
            buffer.write_all(b"\n")?;
        }

        Ok(buffer)
    }

    pub fn serialize_compressed(&self, index: &str, records: &[LogRecord]) -> Result<Vec<u8>, StoreError> {
        let data = self.serialize_ndjson(index, records)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(&data)?;
        Ok(encoder.finish()?)
    }
}

/// Response body of a bulk request.
#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

#[derive(Debug, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Outcome of one document within a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkItemResult {
    Accepted,
    Rejected(String),
}

impl BulkResponse {
    /// Per-document results, in request order. Documents the store did not
    /// report on are rejected.
    pub fn item_results(self, expected: usize) -> Vec<BulkItemResult> {
        let mut results: Vec<BulkItemResult> = self
            .items
            .into_iter()
            .take(expected)
            .map(|item| match item.into_values().next() {
                Some(item) => item.result(),
                None => BulkItemResult::Rejected("empty bulk item".to_string()),
            })
            .collect();

        results.resize(
            expected,
            BulkItemResult::Rejected("no result returned by store".to_string()),
        );
        results
    }
}

impl BulkItem {
    fn result(self) -> BulkItemResult {
        match self.error {
            Some(error) => BulkItemResult::Rejected(error.describe()),
            None if self.status >= 300 => {
                BulkItemResult::Rejected(format!("store returned status {}", self.status))
            }
            None => BulkItemResult::Accepted,
        }
    }
}

impl BulkItemError {
    fn describe(&self) -> String {
        match (&self.kind, &self.reason) {
            (Some(kind), Some(reason)) => format!("{kind}: {reason}"),
            (Some(kind), None) => kind.clone(),
            (None, Some(reason)) => reason.clone(),
            (None, None) => "rejected by store".to_string(),
        }
    }
}
