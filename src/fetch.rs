//! HTTP fetching for pages and binary resources

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("connection timeout fetching {url}")]
    Timeout { url: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("no fixture registered for {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Network seam for the pipeline. Production uses [`HttpFetcher`];
/// tests substitute the map-backed [`StaticFetcher`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a resource as UTF-8 text.
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// Fetch a resource as raw bytes.
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes>;

    /// Content type of a resource, via a metadata (HEAD) request.
    async fn content_type(&self, url: &str) -> Result<Option<String>>;
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: "artfetch/0.1.0".to_string(),
        }
    }
}

/// Reqwest-backed fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }
}

fn classify(url: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| classify(url, &e))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(|e| classify(url, &e))?;
        debug!(url, size = bytes.len(), "download completed");
        Ok(bytes)
    }

    async fn content_type(&self, url: &str) -> Result<Option<String>> {
        debug!(url, "HEAD");

        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| classify(url, &e))?;

        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string()))
    }
}

/// In-memory fetcher backed by a URL → body map.
///
/// Exposed (not just `#[cfg(test)]`) so integration tests can run the
/// full pipeline offline.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Bytes>,
    content_types: HashMap<String, String>,
    head_requests: AtomicU64,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.pages.insert(url.into(), body.into());
    }

    pub fn insert_with_type(
        &mut self,
        url: impl Into<String>,
        body: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) {
        let url = url.into();
        self.content_types.insert(url.clone(), content_type.into());
        self.pages.insert(url, body.into());
    }

    /// Number of metadata (HEAD) requests served so far.
    pub fn head_requests(&self) -> u64 {
        self.head_requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_bytes(url).await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }

    async fn content_type(&self, url: &str) -> Result<Option<String>> {
        self.head_requests.fetch_add(1, Ordering::Relaxed);
        Ok(self.content_types.get(url).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "artfetch/0.1.0");
    }

    #[tokio::test]
    async fn test_static_fetcher_round_trip() {
        let mut fetcher = StaticFetcher::new();
        fetcher.insert("https://example.test/page", "<html></html>");

        let body = fetcher.fetch_text("https://example.test/page").await.unwrap();
        assert_eq!(body, "<html></html>");

        let missing = fetcher.fetch_bytes("https://example.test/other").await;
        assert!(matches!(missing, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_static_fetcher_counts_head_requests() {
        let mut fetcher = StaticFetcher::new();
        fetcher.insert_with_type("https://example.test/img", &b"data"[..], "image/png");

        assert_eq!(fetcher.head_requests(), 0);
        let content_type = fetcher.content_type("https://example.test/img").await.unwrap();
        assert_eq!(content_type.as_deref(), Some("image/png"));
        assert_eq!(fetcher.head_requests(), 1);
    }
}
