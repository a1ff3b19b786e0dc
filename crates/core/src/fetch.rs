//! Document fetching with retry and backoff.
//!
//! The batch coordinator only sees the [`Fetcher`] trait. [`HttpFetcher`]
//! retrieves `http`/`https` pages with reqwest, [`SourceFetcher`] adds local
//! `file://` documents on top of it. Both retry through
//! [`retry_with_backoff`], which doubles the delay after every failed
//! attempt and gives up early once the batch is cancelled.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::FetchError;

/// A retrieved document. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub url: String,
    pub html: String,
}

/// HTTP client configuration for fetching quiz pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-attempt timeout in seconds.
    pub timeout: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Total attempts per URL, including the first (default: 3).
    pub max_attempts: u32,
    /// Delay before the first retry; doubled after every failure (default: 1s).
    pub initial_backoff: Duration,
    /// Upper bound for the retry delay (default: 30s).
    pub max_backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0 Safari/537.36"
                .to_string(),
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl FetchConfig {
    /// Creates a new builder for FetchConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quizsift_core::FetchConfig;
    ///
    /// let config = FetchConfig::builder().timeout(10).max_attempts(5).build();
    /// assert_eq!(config.max_attempts, 5);
    /// ```
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::new()
    }
}

/// Builder for FetchConfig.
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: FetchConfig::default() }
    }

    /// Sets the per-attempt timeout in seconds.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.config.timeout = secs;
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = value.into();
        self
    }

    /// Sets the total number of attempts per URL.
    pub fn max_attempts(mut self, value: u32) -> Self {
        self.config.max_attempts = value;
        self
    }

    /// Sets the delay before the first retry.
    pub fn initial_backoff(mut self, value: Duration) -> Self {
        self.config.initial_backoff = value;
        self
    }

    /// Sets the upper bound for the retry delay.
    pub fn max_backoff(mut self, value: Duration) -> Self {
        self.config.max_backoff = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> FetchConfig {
        self.config
    }
}

impl Default for FetchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Retrieves documents for the batch coordinator.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, retrying as configured. `cancel` is consulted between
    /// attempts only; an attempt in flight always runs to completion.
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchedDocument, FetchError>;
}

/// Runs `operation` until it succeeds, fails permanently or runs out of attempts.
///
/// The delay starts at `initial_backoff` and doubles after every failure,
/// capped at `max_backoff`. The cancellation token is checked before every
/// sleep; a cancelled batch gets [`FetchError::Cancelled`] instead of another
/// attempt.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &FetchConfig, cancel: &CancellationToken, mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "fetch succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt >= max_attempts => {
                tracing::warn!(error = %e, attempts = attempt, "fetch failed, attempts exhausted");
                return Err(FetchError::Exhausted { attempts: attempt, last: Box::new(e) });
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "fetch failed, retrying"
                );

                if cancel.is_cancelled() {
                    return Err(FetchError::Cancelled);
                }

                tokio::time::sleep(delay).await;
                delay = next_backoff(delay, config.max_backoff);
            }
        }
    }
}

/// Doubles `delay`, saturating instead of overflowing, capped at `max`.
fn next_backoff(delay: Duration, max: Duration) -> Duration {
    delay.saturating_mul(2).min(max)
}

/// Parses `url` and checks that its scheme is one of `schemes`.
pub fn parse_url(url: &str, schemes: &[&str]) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(FetchError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            url,
            parsed.scheme()
        )));
    }
    Ok(parsed)
}

/// Fetches `http`/`https` pages with reqwest.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

#[cfg(feature = "fetch")]
impl HttpFetcher {
    /// Builds the shared client. Redirects are followed (up to 10 hops).
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// One attempt, no retry.
    async fn fetch_once(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9,hi;q=0.8")
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16() });
        }

        response.text().await.map_err(|e| self.map_error(e))
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() { FetchError::Timeout { timeout: self.config.timeout } } else { FetchError::Transport(e) }
    }
}

#[cfg(feature = "fetch")]
#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchedDocument, FetchError> {
        let parsed = parse_url(url, &["http", "https"])?;
        let html = retry_with_backoff(&self.config, cancel, || self.fetch_once(&parsed)).await?;
        Ok(FetchedDocument { url: url.to_string(), html })
    }
}

/// Reads a local `file://` document.
pub async fn fetch_file(url: &Url) -> Result<String, FetchError> {
    let path = url
        .to_file_path()
        .map_err(|_| FetchError::InvalidUrl(format!("{}: not a local file path", url)))?;
    Ok(tokio::fs::read_to_string(&path).await?)
}

/// Dispatches on the URL scheme: `file://` is read from disk, everything
/// else goes to [`HttpFetcher`].
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    http: HttpFetcher,
}

#[cfg(feature = "fetch")]
impl SourceFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        Ok(Self { http: HttpFetcher::new(config)? })
    }
}

#[cfg(feature = "fetch")]
#[async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchedDocument, FetchError> {
        let parsed = parse_url(url, &["http", "https", "file"])?;
        if parsed.scheme() == "file" {
            let html = fetch_file(&parsed).await?;
            return Ok(FetchedDocument { url: url.to_string(), html });
        }
        self.http.fetch(url, cancel).await
    }
}
