use super::error::StoreError;
use crate::reliability::RetryPolicy;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

const HEALTH_PATH: &str = "_cluster/health";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub user_agent: String,
    pub enable_compression: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            user_agent: format!("rask-log-monitor/{}", env!("CARGO_PKG_VERSION")),
            enable_compression: false,
        }
    }
}

/// Connection to the document store.
#[derive(Debug)]
pub struct StoreClient {
    client: Client,
    config: StoreConfig,
    base_url: Url,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let mut base_url: Url = config.url.parse().map_err(|e| {
            StoreError::InvalidConfiguration(format!("Invalid store URL '{}': {}", config.url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidConfiguration(format!(
                "Store URL '{}' cannot carry a path",
                config.url
            )));
        }
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                StoreError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Resolve `path` (no leading slash) against the store URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::InvalidConfiguration(format!("Invalid store path '{path}': {e}")))
    }

    /// Send a request, mapping timeouts and non-2xx statuses to `StoreError`.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<Response, StoreError> {
        let response = timeout(self.config.timeout, request.send())
            .await
            .map_err(|_| StoreError::RequestTimeout(format!("{operation} timed out")))?
            .map_err(|e| {
                if e.is_timeout() {
                    StoreError::RequestTimeout(format!("{operation} timed out"))
                } else {
                    StoreError::NetworkError(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::HttpError {
                status: status.as_u16(),
                message: format!("{operation} failed: {}", first_line(&body)),
            })
        }
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        let url = self.endpoint(HEALTH_PATH)?;
        self.send(self.client.get(url), "Health check").await?;
        Ok(())
    }

    /// Poll the health endpoint until it answers or the retry budget runs out.
    pub async fn wait_until_ready(
        &self,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        info!("Waiting for store at {} to be ready", self.base_url);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let last_error = match self.health_check().await {
                Ok(()) => {
                    info!("Store is ready after {} attempt(s)", attempts);
                    return Ok(());
                }
                Err(e) => e.to_string(),
            };

            if policy.is_exhausted(attempts) {
                return Err(StoreError::Unavailable {
                    attempts,
                    last_error,
                });
            }

            let delay = policy.calculate_delay(attempts - 1);
            warn!(
                "Attempt {}/{}: store not ready ({}), retrying in {:?}",
                attempts, policy.max_attempts, last_error, delay
            );

            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Readiness wait cancelled");
                    return Err(StoreError::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

impl Drop for StoreClient {
    fn drop(&mut self) {
        debug!("Releasing store connection to {}", self.base_url);
    }
}

fn first_line(body: &str) -> &str {
    let line = body.lines().next().unwrap_or("").trim();
    if line.is_empty() { "<empty body>" } else { line }
}
