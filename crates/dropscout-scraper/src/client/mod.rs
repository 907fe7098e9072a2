//! HTTP fetcher shared by every extractor in a crawl session.
//!
//! Each request goes cache → rate limiter → GET with retry; successful
//! bodies are written back to the cache.

mod origin;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::cache::{CacheBucket, ResponseCache};
use crate::error::ScraperError;
use crate::rate_limit::{retry_with_backoff, RateLimiter};

pub use origin::{extract_domain, extract_store_origin, store_label};

/// Connection and retry settings for a [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff: `backoff_base_ms * 2^attempt`.
    pub backoff_base_ms: u64,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "dropscout/0.1 (product-discovery)".to_string(),
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

/// Fetches pages and feeds through the session's cache and rate limiter.
///
/// Status mapping: 429 → [`ScraperError::RateLimited`], 404 →
/// [`ScraperError::NotFound`], other non-2xx →
/// [`ScraperError::UnexpectedStatus`]. Transient failures are retried per
/// [`retry_with_backoff`].
///
/// Once [`close`](Self::close)d, the fetcher makes no further network
/// requests; uncached fetches fail with [`ScraperError::SessionClosed`].
pub struct PageFetcher {
    client: Client,
    cache: Arc<ResponseCache>,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    backoff_base_ms: u64,
    closed: AtomicBool,
}

impl PageFetcher {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        settings: &FetcherSettings,
        cache: Arc<ResponseCache>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&settings.user_agent)
            .build()?;
        Ok(Self {
            client,
            cache,
            limiter,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
            closed: AtomicBool::new(false),
        })
    }

    /// Stops all further network requests through this fetcher, including
    /// pending retries of requests already in flight.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self, url: &str) -> Result<(), ScraperError> {
        if self.is_closed() {
            return Err(ScraperError::SessionClosed {
                url: url.to_owned(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Returns the body at `url`, served from `bucket` when a fresh entry
    /// exists.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] if `url` does not parse.
    /// - [`ScraperError::RateLimited`] / [`ScraperError::Http`] after all
    ///   retries are exhausted.
    /// - [`ScraperError::NotFound`] / [`ScraperError::UnexpectedStatus`] for
    ///   non-2xx responses.
    /// - [`ScraperError::SessionClosed`] on a cache miss after
    ///   [`close`](Self::close).
    pub async fn fetch_text(&self, url: &str, bucket: CacheBucket) -> Result<String, ScraperError> {
        validate_url(url)?;
        if let Some(body) = self.cache.get(url, bucket).await {
            return Ok(body);
        }

        let body = self.fetch_uncached(url).await?;
        self.cache.set(url, bucket, &body).await;
        Ok(body)
    }

    /// Fetches and deserializes a JSON document, caching it in the feed
    /// bucket only once it parses as `T`.
    ///
    /// # Errors
    ///
    /// As [`Self::fetch_text`], plus [`ScraperError::Deserialize`] when the
    /// body does not match `T`.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ScraperError> {
        validate_url(url)?;
        if let Some(body) = self.cache.get(url, CacheBucket::Feed).await {
            match serde_json::from_str::<T>(&body) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => tracing::debug!(url, error = %e, "cached feed no longer parses, refetching"),
            }
        }

        let body = self.fetch_uncached(url).await?;
        let parsed = serde_json::from_str::<T>(&body).map_err(|e| ScraperError::Deserialize {
            context: format!("feed from {url}"),
            source: e,
        })?;
        self.cache.set(url, CacheBucket::Feed, &body).await;
        Ok(parsed)
    }

    async fn fetch_uncached(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            self.ensure_open(url)?;
            self.limiter.wait().await;
            self.ensure_open(url)?;

            let response = self
                .client
                .get(url)
                .header(
                    reqwest::header::ACCEPT,
                    "text/html,application/json;q=0.9,*/*;q=0.8",
                )
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);

                return Err(ScraperError::RateLimited {
                    domain: extract_domain(url),
                    retry_after_secs,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }
}

fn validate_url(url: &str) -> Result<(), ScraperError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
        })
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
