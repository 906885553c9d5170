//! HTTP fetching with bounded concurrency, batching and retry.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait for retrieving a page body or resolving a redirect
//! - [`HttpFetcher`]: `reqwest` implementation paced by a shared [`RateLimiter`]
//! - [`RetryFetch`]: decorator adding exponential backoff to any [`Fetch`]
//! - [`fetch_all`] / [`fetch_in_batches`]: order-preserving multi-URL helpers
//!
//! LinkedIn signals rate limiting by answering with an empty body, so an empty
//! body is reported as [`FetchError::EmptyBody`] and retried like a timeout.

use crate::rate_limit::RateLimiter;
use crate::utils::host_of;
use futures::stream::{self, StreamExt};
use rand::{rng, Rng};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Why a request produced no usable body.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("empty response body from {url} (probably rate limited)")]
    EmptyBody { url: String },

    #[error("rate limited by {url}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Whether the failure looks transient and worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::EmptyBody { .. } | FetchError::RateLimited { .. } | FetchError::Timeout { .. }
        )
    }

    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::EmptyBody { .. } => "empty_body",
            FetchError::RateLimited { .. } => "rate_limited",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Status { status, .. } if *status == StatusCode::NOT_FOUND => "not_found",
            FetchError::Status { .. } => "http_status",
            FetchError::Transport { .. } => "transport",
        }
    }
}

/// Retrieve pages over HTTP GET.
pub trait Fetch {
    /// Fetch `url` and return its body.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Follow redirects from `url` and return the final URL.
    async fn resolve(&self, url: &str) -> Result<String, FetchError>;
}

/// Client settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout: Duration,
}

/// [`Fetch`] over `reqwest`, waiting on the rate limiter before every request.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings, limiter: Arc<RateLimiter>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { client, limiter })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        self.limiter.acquire(&host_of(url)).await;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(FetchError::RateLimited {
                url: url.to_string(),
                retry_after,
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let body = self
            .send(url)
            .await?
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        if body.trim().is_empty() {
            warn!(%url, "Hit rate limit: empty response body");
            return Err(FetchError::EmptyBody { url: url.to_string() });
        }
        debug!(%url, bytes = body.len(), "Fetched page");
        Ok(body)
    }

    #[instrument(level = "debug", skip(self))]
    async fn resolve(&self, url: &str) -> Result<String, FetchError> {
        let response = self.send(url).await?;
        Ok(response.url().to_string())
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`] implementation.
///
/// Only retryable failures (see [`FetchError::is_retryable`]) are retried.
/// The delay before attempt `n` is:
/// ```text
/// delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..250ms)
/// ```
/// A `Retry-After` hint from the server replaces the computed delay when it
/// is longer.
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: Fetch,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize, error: &FetchError) -> Duration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self
            .base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        let delay = delay + Duration::from_millis(jitter_ms);

        match error {
            FetchError::RateLimited {
                retry_after: Some(hint),
                ..
            } if *hint > delay => *hint,
            _ => delay,
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Fetch for RetryFetch<T>
where
    T: Fetch,
{
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            %url,
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            kind = e.kind(),
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt, &e);
                    warn!(
                        %url,
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        kind = e.kind(),
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn resolve(&self, url: &str) -> Result<String, FetchError> {
        self.inner.resolve(url).await
    }
}

/// Fetch every URL with at most `concurrency` requests in flight.
///
/// # Arguments
///
/// * `fetcher` - Fetcher used for every request (usually a [`RetryFetch`])
/// * `urls` - Pages to fetch
/// * `concurrency` - Maximum requests in flight (treated as at least 1)
///
/// # Returns
///
/// One body per URL, in the order of `urls`. A request that fails is logged
/// and contributes an empty body at its position.
#[instrument(level = "info", skip_all, fields(count = urls.len(), concurrency = concurrency))]
pub async fn fetch_all<F: Fetch>(fetcher: &F, urls: &[String], concurrency: usize) -> Vec<String> {
    stream::iter(urls)
        .map(|url| async move {
            match fetcher.fetch(url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(%url, kind = e.kind(), error = %e, "Fetch failed; treating as empty page");
                    String::new()
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Fetch `urls` in consecutive batches of `batch_size`, sleeping
/// `inter_batch_delay` between batches (never after the last one).
///
/// # Arguments
///
/// * `fetcher` - Fetcher used for every request
/// * `urls` - Pages to fetch
/// * `batch_size` - Requests issued concurrently per batch
/// * `inter_batch_delay` - Pause between two batches
///
/// # Returns
///
/// One body per URL in input order, with empty bodies for failed requests
/// (see [`fetch_all`]).
#[instrument(level = "info", skip_all, fields(count = urls.len(), batch_size = batch_size))]
pub async fn fetch_in_batches<F: Fetch>(
    fetcher: &F,
    urls: &[String],
    batch_size: usize,
    inter_batch_delay: Duration,
) -> Vec<String> {
    let total = urls.len();
    let mut bodies = Vec::with_capacity(total);
    let mut batches = urls.chunks(batch_size.max(1)).peekable();

    while let Some(batch) = batches.next() {
        bodies.extend(fetch_all(fetcher, batch, batch.len()).await);
        info!(fetched = bodies.len(), total, "Fetched batch of pages");

        if batches.peek().is_some() {
            sleep(inter_batch_delay).await;
        }
    }

    bodies
}
