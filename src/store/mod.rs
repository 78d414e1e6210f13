//! HTTP access to the Elasticsearch-compatible document store.
//!
//! `StoreClient` owns the connection pool. The ingestion client and the alert
//! evaluator borrow or own one for their whole run; dropping it releases the
//! pooled connections.

pub mod bulk;
pub mod client;
pub mod document;
pub mod error;
pub mod ingest;
pub mod query;

pub use bulk::{BulkItemResult, BulkSerializer};
pub use client::{StoreClient, StoreConfig};
pub use document::{StoreDocument, document_id};
pub use error::StoreError;
pub use ingest::{
    BatchOutcome, DEFAULT_INDEX_PREFIX, IngestionClient, IngestionReport, RecordRef,
    RejectedRecord, daily_index,
};
pub use query::{DEFAULT_MAX_WINDOW_DOCS, WindowQuery};
