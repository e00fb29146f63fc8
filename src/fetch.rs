//! Rate-limited, bounded-concurrency document acquisition.
//!
//! Every fetch waits on a shared rate limiter and then takes one permit
//! from a fixed-size pool before touching the network, so callers above
//! (the pagination crawler, the per-prediction fan-out) can issue any
//! number of logical requests while the physical request rate and
//! concurrency stay bounded.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use scraper::Html;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::HttpFetcherConfig;
use crate::error::FetchError;

/// Source of parsed HTML documents.
///
/// Implementations must be safe to share across tasks; the crawler and
/// the fan-out aggregator both hold one behind an `Arc`.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    /// Fetch `url` and parse the body into a document tree.
    ///
    /// The fetcher never retries; any error aborts this single call and
    /// is returned to the immediate caller.
    async fn fetch_html(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<Html, FetchError>;
}

/// Shared admission control: rate limiter plus in-flight permit pool.
///
/// Admission order is limiter first, permit second, both abortable by
/// cancellation. The returned permit is an RAII guard, so the slot is
/// released on every exit path.
struct Throttle {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    permits: Semaphore,
}

impl Throttle {
    fn new(config: &HttpFetcherConfig) -> Result<Self> {
        let rate = NonZeroU32::new(config.requests_per_second)
            .context("requests_per_second must be greater than 0")?;
        let burst = NonZeroU32::new(config.burst_size)
            .context("burst_size must be greater than 0")?;
        if config.max_concurrent_requests == 0 {
            anyhow::bail!("max_concurrent_requests must be greater than 0");
        }

        Ok(Self {
            limiter: RateLimiter::direct(Quota::per_second(rate).allow_burst(burst)),
            permits: Semaphore::new(config.max_concurrent_requests),
        })
    }

    async fn admit(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<SemaphorePermit<'_>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::cancelled(url));
        }

        tokio::select! {
            _ = self.limiter.until_ready() => {}
            _ = cancel.cancelled() => return Err(FetchError::cancelled(url)),
        }

        let permit = tokio::select! {
            permit = self.permits.acquire() => {
                permit.map_err(|_| FetchError::cancelled(url))?
            }
            _ = cancel.cancelled() => return Err(FetchError::cancelled(url)),
        };

        Ok(permit)
    }
}

/// HTTP-backed [`HtmlFetcher`] built on a shared [`Throttle`].
pub struct HttpFetcher {
    client: Client,
    throttle: Throttle,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let throttle = Throttle::new(&config)?;

        Ok(Self { client, throttle })
    }
}

#[async_trait]
impl HtmlFetcher for HttpFetcher {
    async fn fetch_html(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<Html, FetchError> {
        let _permit = self.throttle.admit(cancel, url).await?;

        debug!(url, "fetching document");

        // Once the request is in flight it runs to completion; cancellation
        // only aborts the admission waits above.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::transport(url, source))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::HttpStatus {
                status,
                url: url.to_owned(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::transport(url, source))?;
        let body = std::str::from_utf8(&bytes).map_err(|err| FetchError::Parse {
            url: url.to_owned(),
            reason: err.to_string(),
        })?;

        let document = Html::parse_document(body);
        debug!(url, bytes = body.len(), "fetched document");
        Ok(document)
    }
}
