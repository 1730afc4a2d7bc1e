//! Shared HTTP resources and fetch error classification.
//!
//! All page and asset requests go through a single global [`reqwest::Client`]
//! so connection pooling works across every concurrent download. Responses
//! are classified into transient and permanent failures; the retry policy
//! that consumes that classification lives in [`crate::pipeline::config`].

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::pipeline::config::RetryPolicy;

/// HTTP connect timeout (seconds) - time to establish TCP connection
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds) - overall time for the entire request
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Browser-like User-Agent; the catalog site serves stripped pages to
/// unknown clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Global HTTP client shared by page and asset retrieval.
///
/// Configured with explicit timeouts to prevent indefinite hangs:
/// - Connect timeout: 10 seconds
/// - Request timeout: 30 seconds
static GLOBAL_HTTP_CLIENT: Lazy<Arc<Client>> = Lazy::new(|| {
    Arc::new(
        Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                panic!("FATAL: Failed to build HTTP client: {e}. Check system TLS configuration.");
            }),
    )
});

/// Get the global HTTP client (cheap Arc clone).
pub fn global_http_client() -> Arc<Client> {
    GLOBAL_HTTP_CLIENT.clone()
}

/// A single fetch failure, classified for retry purposes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Timeout, connection reset, 5xx or 429 response. Worth retrying.
    #[error("transient fetch error: {0}")]
    Transient(String),

    /// 4xx (other than 429) or an unusable body. Retrying will not help.
    #[error("permanent fetch error: {0}")]
    Permanent(String),
}

impl FetchError {
    /// Whether the retry policy applies to this failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

/// Classify a non-success HTTP status.
///
/// Retryable: 5xx and 429. Everything else in the 4xx range is permanent.
fn classify_status(status: StatusCode) -> FetchError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        FetchError::Transient(format!("server returned {status}"))
    } else {
        FetchError::Permanent(format!("server returned {status}"))
    }
}

/// Execute a GET and return the raw body, classifying failures.
///
/// Transport-level errors (timeout, connection reset) are transient; an
/// empty body on a success status is permanent since re-requesting the same
/// URL yields the same malformed resource.
async fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transient(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(classify_status(status));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::Transient(format!("failed to read body: {e}")))?;

    if body.is_empty() {
        return Err(FetchError::Permanent("empty response body".to_string()));
    }

    Ok(body.to_vec())
}

/// Retrieves a single binary asset. Retry and backoff are the caller's
/// concern, so failure injection in tests stays trivial.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch the asset at `url`, returning its bytes.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`AssetFetcher`] backed by the global HTTP client.
pub struct HttpAssetFetcher {
    client: Arc<Client>,
}

impl HttpAssetFetcher {
    /// Create a fetcher over the shared client.
    pub fn new() -> Self {
        Self {
            client: global_http_client(),
        }
    }
}

impl Default for HttpAssetFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url, "fetching asset");
        get_bytes(&self.client, url).await
    }
}

/// HTML page client with built-in retry for catalog enumeration.
///
/// Unlike asset downloads, where the worker owns the retry loop, page
/// fetches retry internally: catalog callers only care whether the page was
/// ultimately obtainable.
pub struct PageClient {
    client: Arc<Client>,
    retry: RetryPolicy,
}

impl PageClient {
    /// Create a page client over the shared HTTP client.
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            client: global_http_client(),
            retry,
        }
    }

    /// Fetch a page as text, retrying transient failures with backoff.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = None;

        for attempt in 1..=self.retry.max_attempts {
            match get_bytes(&self.client, url).await {
                Ok(body) => {
                    let text = String::from_utf8_lossy(&body).into_owned();
                    return Ok(text);
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        url,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "page fetch failed, will retry"
                    );
                    last_error = Some(e);
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.backoff(attempt)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetchError::Transient("all retries exhausted".to_string())))
    }
}
