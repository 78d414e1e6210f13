use super::bulk::{BulkItemResult, BulkResponse, BulkSerializer};
use super::client::StoreClient;
use super::error::StoreError;
use crate::domain::LogRecord;
use crate::reliability::RetryPolicy;
use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

const BULK_PATH: &str = "_bulk";
/// Batches larger than this are gzip-compressed when compression is enabled.
const COMPRESSION_MIN_DOCS: usize = 100;
pub const DEFAULT_INDEX_PREFIX: &str = "ecommerce-logs";

/// Position of a record in the ingested input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRef {
    pub index: usize,
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    pub record: RecordRef,
    pub reason: String,
}

/// Result of sending one bulk request.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub batch_id: String,
    pub size: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub attempts: u32,
    pub latency: Duration,
    pub compressed: bool,
    pub failure: Option<String>,
}

/// Summary of an ingestion run.
///
/// `accepted_count + rejected_count` equals the number of records supplied and
/// `errors` holds exactly one entry per rejected record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub errors: Vec<RejectedRecord>,
    pub batches: Vec<BatchOutcome>,
}

impl IngestionReport {
    pub fn total(&self) -> usize {
        self.accepted_count + self.rejected_count
    }

    pub fn is_complete(&self) -> bool {
        self.rejected_count == 0
    }

    pub fn failed_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.failure.is_some()).count()
    }
}

/// Daily index name, e.g. `ecommerce-logs-2024.01.01`.
pub fn daily_index(prefix: &str, date: DateTime<Utc>) -> String {
    format!("{}-{}", prefix, date.format("%Y.%m.%d"))
}

/// Loads records into the store through the bulk API.
pub struct IngestionClient<'a> {
    store: &'a StoreClient,
    serializer: BulkSerializer,
    index: String,
    batch_policy: RetryPolicy,
}

impl<'a> IngestionClient<'a> {
    /// Targets today's index under `index_prefix`.
    pub fn new(store: &'a StoreClient, index_prefix: &str) -> Self {
        Self {
            store,
            serializer: BulkSerializer::new(),
            index: daily_index(index_prefix, Utc::now()),
            batch_policy: RetryPolicy::none(),
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Retry policy applied to whole-batch transport and 5xx failures.
    pub fn with_batch_policy(mut self, policy: RetryPolicy) -> Self {
        self.batch_policy = policy;
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Send `records` in batches of `batch_size`.
    ///
    /// A failed batch never stops the remaining ones; its records are counted
    /// as rejected with the failure as reason.
    pub async fn ingest(&self, records: &[LogRecord], batch_size: usize) -> IngestionReport {
        let batch_size = batch_size.max(1);
        let mut report = IngestionReport::default();

        info!(
            "Ingesting {} records into '{}' in batches of {}",
            records.len(),
            self.index,
            batch_size
        );

        for (chunk_index, chunk) in records.chunks(batch_size).enumerate() {
            let offset = chunk_index * batch_size;
            let outcome = self.send_chunk(offset, chunk, &mut report).await;
            report.batches.push(outcome);
        }

        info!(
            accepted = report.accepted_count,
            rejected = report.rejected_count,
            batches = report.batches.len(),
            "Ingestion finished"
        );

        report
    }

    async fn send_chunk(
        &self,
        offset: usize,
        chunk: &[LogRecord],
        report: &mut IngestionReport,
    ) -> BatchOutcome {
        let batch_id = Uuid::new_v4().to_string();
        let compressed = self.store.config().enable_compression && chunk.len() > COMPRESSION_MIN_DOCS;
        let start = Instant::now();

        let mut outcome = BatchOutcome {
            batch_id,
            size: chunk.len(),
            accepted: 0,
            rejected: 0,
            attempts: 0,
            latency: Duration::ZERO,
            compressed,
            failure: None,
        };

        let result = self.send_with_retry(chunk, compressed, &mut outcome).await;
        outcome.latency = start.elapsed();

        match result {
            Ok(items) => {
                for (position, (record, item)) in chunk.iter().zip(items).enumerate() {
                    match item {
                        BulkItemResult::Accepted => outcome.accepted += 1,
                        BulkItemResult::Rejected(reason) => {
                            outcome.rejected += 1;
                            report.errors.push(rejection(offset + position, record, reason));
                        }
                    }
                }
                if outcome.rejected > 0 {
                    warn!(
                        "Batch {}: store rejected {} of {} documents",
                        outcome.batch_id, outcome.rejected, outcome.size
                    );
                } else {
                    debug!(
                        "Batch {} accepted ({} documents) in {:?}",
                        outcome.batch_id, outcome.size, outcome.latency
                    );
                }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    "Batch {} failed after {} attempt(s): {}",
                    outcome.batch_id, outcome.attempts, reason
                );
                for (position, record) in chunk.iter().enumerate() {
                    report
                        .errors
                        .push(rejection(offset + position, record, reason.clone()));
                }
                outcome.rejected = chunk.len();
                outcome.failure = Some(reason);
            }
        }

        report.accepted_count += outcome.accepted;
        report.rejected_count += outcome.rejected;
        outcome
    }

    async fn send_with_retry(
        &self,
        chunk: &[LogRecord],
        compressed: bool,
        outcome: &mut BatchOutcome,
    ) -> Result<Vec<BulkItemResult>, StoreError> {
        let payload = if compressed {
            self.serializer.serialize_compressed(&self.index, chunk)?
        } else {
            self.serializer.serialize_ndjson(&self.index, chunk)?
        };

        loop {
            outcome.attempts += 1;
            match self.post_bulk(payload.clone(), compressed, chunk.len()).await {
                Ok(items) => return Ok(items),
                Err(e) if e.is_transient() && !self.batch_policy.is_exhausted(outcome.attempts) => {
                    let delay = self.batch_policy.calculate_delay(outcome.attempts - 1);
                    warn!(
                        "Batch {} attempt {}/{} failed ({}), retrying in {:?}",
                        outcome.batch_id, outcome.attempts, self.batch_policy.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_bulk(
        &self,
        payload: Vec<u8>,
        compressed: bool,
        expected: usize,
    ) -> Result<Vec<BulkItemResult>, StoreError> {
        let url = self.store.endpoint(BULK_PATH)?;
        let request = self
            .store
            .http()
            .post(url)
            .headers(bulk_headers(compressed))
            .body(payload);

        let response = self.store.send(request, "Bulk write").await?;
        let body: BulkResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("Malformed bulk response: {e}")))?;

        if body.items.len() != expected {
            warn!(
                "Bulk response lists {} items for {} documents",
                body.items.len(),
                expected
            );
        }
        if body.errors {
            debug!("Bulk response flags item-level errors");
        }

        Ok(body.item_results(expected))
    }
}

fn bulk_headers(compressed: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-ndjson"));
    if compressed {
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    }
    headers
}

fn rejection(index: usize, record: &LogRecord, reason: String) -> RejectedRecord {
    RejectedRecord {
        record: RecordRef {
            index,
            transaction_id: record.transaction_id.clone(),
        },
        reason,
    }
}
