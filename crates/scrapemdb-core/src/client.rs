//! Rate-limited HTTP client
//!
//! Fetches page HTML for the static navigator. Requests are spaced by a
//! rate limiter and transient failures (429, 5xx) are retried with
//! exponential backoff in a bounded loop.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Result, ScrapeError};

/// Default User-Agent mimicking a modern browser
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// English pages keep the field texts the schema expects
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Rate limiter to control request frequency
///
/// Ensures that requests are spaced at least `min_interval` apart.
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per second
    ///
    /// # Example
    /// ```
    /// use scrapemdb_core::client::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2.0).unwrap(); // 2 requests per second
    /// assert!(RateLimiter::new(0.0).is_err());
    /// ```
    ///
    /// # Errors
    /// `ScrapeError::InvalidConfig` unless the rate is finite and positive
    pub fn new(requests_per_second: f64) -> Result<Self> {
        let invalid =
            || ScrapeError::InvalidConfig(format!("requests per second: {requests_per_second}"));
        if !(requests_per_second.is_finite() && requests_per_second > 0.0) {
            return Err(invalid());
        }
        let min_interval =
            Duration::try_from_secs_f64(1.0 / requests_per_second).map_err(|_| invalid())?;
        let now = Instant::now();
        Ok(Self {
            min_interval,
            last_request: Arc::new(Mutex::new(now.checked_sub(min_interval).unwrap_or(now))),
        })
    }

    /// Wait until the next request is allowed.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }

        *last = Instant::now();
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum requests per second (default: 2.0)
    pub requests_per_second: f64,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Retries after the first attempt on 429/5xx (default: 3)
    pub max_retries: u32,
    /// Backoff before the first retry, doubled each time (default: 1s)
    pub retry_base_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2.0,
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
        }
    }
}

/// HTTP client with rate limiting and retry logic
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: RateLimiter,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl HttpClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Errors
    /// `ScrapeError::SessionFailure` if the rate is invalid or the underlying
    /// client cannot be built
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let rate_limiter = RateLimiter::new(config.requests_per_second)
            .map_err(|e| ScrapeError::SessionFailure(e.to_string()))?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScrapeError::SessionFailure(e.to_string()))?;

        Ok(Self {
            client,
            rate_limiter,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    /// Fetch the body of an absolute URL.
    ///
    /// Returns the final URL (after redirects) together with the HTML.
    ///
    /// # Errors
    /// - `ScrapeError::HttpError` - network or HTTP error after all retries
    /// - `ScrapeError::RateLimited` - server returned 429 after all retries
    /// - `ScrapeError::NotFound` - server returned 404
    pub async fn fetch(&self, url: &str) -> Result<(String, String)> {
        let mut attempt = 0;
        loop {
            self.rate_limiter.acquire().await;
            debug!(url, attempt, "GET");

            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status.is_success() {
                let final_url = response.url().to_string();
                return Ok((final_url, response.text().await?));
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScrapeError::NotFound(url.to_string()));
            }

            let transient =
                status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if transient && attempt < self.max_retries {
                let delay = self.backoff_delay(attempt);
                warn!(url, status = status.as_u16(), attempt, ?delay, "retrying request");
                sleep(delay).await;
                attempt += 1;
                continue;
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ScrapeError::RateLimited);
            }
            return Err(response
                .error_for_status()
                .err()
                .map(ScrapeError::HttpError)
                .unwrap_or_else(|| ScrapeError::NavigationFailure {
                    url: url.to_string(),
                    reason: format!("unexpected status {status}"),
                }));
        }
    }

    /// Exponential backoff: base, 2*base, 4*base, ...
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay * 2u32.pow(attempt)
    }
}
