use async_trait::async_trait;
use futures_util::stream::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::backoff::RetryPolicy;
use crate::config::Config;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const PDF_ACCEPT: &str = "application/pdf,application/octet-stream;q=0.9,*/*;q=0.8";

/// Body chunks of a remote file, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, FetchError>> + Send>>;

/// HTTP capability the crawler depends on.
///
/// Implemented by [`HttpClient`] for real runs; tests plug in scripted transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the body as text. One attempt, no retry.
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;

    /// GET `url` and hand back the body as a stream. One attempt, no retry.
    async fn open_stream(&self, url: &str, timeout: Duration) -> Result<ByteStream, FetchError>;
}

/// HTTP client for making web requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with pooled connections and a bounded redirect chain
    pub fn new(user_agent: impl Into<String>) -> Result<Self, FetchError> {
        let user_agent = user_agent.into();
        let client = reqwest::Client::builder()
            .user_agent(&user_agent)
            .connect_timeout(Duration::from_secs(Config::CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(Config::POOL_IDLE_PER_HOST)
            .tcp_nodelay(true)
            .redirect(reqwest::redirect::Policy::limited(Config::MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, user_agent })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn send(
        &self,
        url: &str,
        timeout: Duration,
        accept: &str,
    ) -> Result<reqwest::Response, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(Self::classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response)
    }

    /// Classify reqwest errors into our FetchError types
    fn classify_error(error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout;
        }

        let error_msg = error.to_string().to_lowercase();

        if error_msg.contains("connection refused") {
            return FetchError::ConnectionRefused;
        }

        if error_msg.contains("dns") || error_msg.contains("name resolution") {
            return FetchError::DnsError;
        }

        if error.is_body() || error.is_decode() {
            return FetchError::BodyError(error.to_string());
        }

        FetchError::NetworkError(error.to_string())
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self.send(url, timeout, HTML_ACCEPT).await?;
        response.text().await.map_err(Self::classify_error)
    }

    async fn open_stream(&self, url: &str, timeout: Duration) -> Result<ByteStream, FetchError> {
        let response = self.send(url, timeout, PDF_ACCEPT).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(Self::classify_error));
        Ok(Box::pin(stream))
    }
}

/// Fetch a page's HTML, retrying transient failures with a fixed pause.
///
/// Returns `None` once the attempt budget is spent or the failure is permanent.
pub async fn fetch_html<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    policy: RetryPolicy,
    timeout: Duration,
) -> Option<String> {
    let mut attempt = 0;

    while attempt < policy.max_attempts {
        attempt += 1;

        match transport.get_text(url, timeout).await {
            Ok(html) => return Some(html),
            Err(e) if !e.is_retryable() => {
                debug!("Giving up on {} after permanent error: {}", url, e);
                return None;
            }
            Err(e) => {
                if policy.delay_after(attempt).is_some() {
                    warn!("[Retry Fetch] {} (Try {}) after: {}", url, attempt + 1, e);
                }
                if !policy.wait_after(attempt).await {
                    break;
                }
            }
        }
    }

    None
}

/// Errors that can occur during HTTP fetching
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection refused - server not accepting connections")]
    ConnectionRefused,

    #[error("DNS resolution failed")]
    DnsError,

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    BodyError(String),
}

impl FetchError {
    /// Check if this error is retryable (transient) or permanent
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::InvalidUrl(_) | FetchError::Client(_) => false,
            // Client errors won't change on retry, except timeouts and throttling
            FetchError::Status(code) => !(400..500).contains(code) || *code == 408 || *code == 429,
            FetchError::NetworkError(_)
            | FetchError::ConnectionRefused
            | FetchError::DnsError
            | FetchError::Timeout
            | FetchError::BodyError(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `failures` times with `error`, then serves `body`.
    struct FlakyPage {
        failures: u32,
        error: FetchError,
        body: String,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for FlakyPage {
        async fn get_text(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(self.error.clone())
            } else {
                Ok(self.body.clone())
            }
        }

        async fn open_stream(&self, _url: &str, _timeout: Duration) -> Result<ByteStream, FetchError> {
            Err(FetchError::Status(404))
        }
    }

    fn flaky(failures: u32, error: FetchError) -> FlakyPage {
        FlakyPage {
            failures,
            error,
            body: "<html></html>".to_string(),
            calls: AtomicU32::new(0),
        }
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let client = HttpClient::new("TestBot/1.0").unwrap();

        let result = client.get_text("not-a-url", Duration::from_secs(5)).await;

        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new("TestBot/1.0").unwrap();
        assert_eq!(client.user_agent(), "TestBot/1.0");
    }

    #[tokio::test]
    async fn test_fetch_html_recovers_after_transient_failures() {
        let page = flaky(2, FetchError::Timeout);
        let html = fetch_html(&page, "https://test.local/", RetryPolicy::without_delay(3), Duration::from_secs(1)).await;

        assert_eq!(html.as_deref(), Some("<html></html>"));
        assert_eq!(page.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_html_gives_up_after_budget() {
        let page = flaky(10, FetchError::NetworkError("connection reset".to_string()));
        let html = fetch_html(&page, "https://test.local/", RetryPolicy::without_delay(3), Duration::from_secs(1)).await;

        assert!(html.is_none());
        assert_eq!(page.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_html_stops_on_permanent_error() {
        let page = flaky(10, FetchError::Status(404));
        let html = fetch_html(&page, "https://test.local/", RetryPolicy::without_delay(3), Duration::from_secs(1)).await;

        assert!(html.is_none());
        assert_eq!(page.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(FetchError::Status(429).is_retryable());
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::InvalidUrl("x".to_string()).is_retryable());
    }
}
