use super::client::StoreClient;
use super::document::StoreDocument;
use super::error::StoreError;
use crate::domain::LogRecord;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

pub const DEFAULT_MAX_WINDOW_DOCS: usize = 10_000;

/// Search for the documents of the last `window_minutes` across all daily
/// indices of a prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowQuery {
    pub index_pattern: String,
    /// 0 selects every document in the indices
    pub window_minutes: u64,
    pub max_docs: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(rename = "_source")]
    source: Value,
}

impl WindowQuery {
    pub fn new(index_prefix: &str, window_minutes: u64) -> Self {
        Self {
            index_pattern: format!("{index_prefix}-*"),
            window_minutes,
            max_docs: DEFAULT_MAX_WINDOW_DOCS,
        }
    }

    pub fn with_max_docs(mut self, max_docs: usize) -> Self {
        self.max_docs = max_docs;
        self
    }

    pub fn search_path(&self) -> String {
        format!("{}/_search", self.index_pattern)
    }

    /// Request body for a window ending at `now`.
    pub fn body(&self, now: DateTime<Utc>) -> Value {
        let query = if self.window_minutes == 0 {
            json!({ "match_all": {} })
        } else {
            let minutes = i64::try_from(self.window_minutes).unwrap_or(i64::MAX);
            let since = Duration::try_minutes(minutes)
                .and_then(|window| now.checked_sub_signed(window))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            json!({
                "range": {
                    "@timestamp": {
                        "gte": since.to_rfc3339_opts(SecondsFormat::Millis, true),
                        "lte": now.to_rfc3339_opts(SecondsFormat::Millis, true),
                    }
                }
            })
        };

        json!({
            "size": self.max_docs,
            "query": query,
            "sort": [{ "@timestamp": { "order": "asc" } }],
        })
    }

    /// Fetch the window and convert hits back into records. Documents that do
    /// not deserialize are skipped.
    pub async fn fetch(
        &self,
        store: &StoreClient,
        now: DateTime<Utc>,
    ) -> Result<Vec<LogRecord>, StoreError> {
        let url = store.endpoint(&self.search_path())?;
        let request = store.http().post(url).json(&self.body(now));
        let response = store.send(request, "Window search").await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("Malformed search response: {e}")))?;

        let total = body.hits.hits.len();
        let records: Vec<LogRecord> = body
            .hits
            .hits
            .into_iter()
            .filter_map(|hit| match serde_json::from_value::<StoreDocument>(hit.source) {
                Ok(doc) => Some(doc.into()),
                Err(e) => {
                    warn!(
                        "Skipping document {}: {}",
                        hit.id.as_deref().unwrap_or("<no id>"),
                        e
                    );
                    None
                }
            })
            .collect();

        debug!(
            "Window search on '{}' returned {} hits ({} usable)",
            self.index_pattern,
            total,
            records.len()
        );
        if total >= self.max_docs {
            warn!(
                "Window search hit the {} document cap; metrics cover a truncated window",
                self.max_docs
            );
        }

        Ok(records)
    }
}
