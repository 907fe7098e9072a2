use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use dropscout_scraper::{PageFetcher, RateLimiter, ResponseCache};

use crate::error::CrawlError;
use crate::settings::CrawlerSettings;

/// Network resources for one crawl run. Logs its own opening and closing;
/// the close happens in `Drop`, so it runs on every exit path.
///
/// Closing also closes the fetcher: extractor tasks that outlive the run
/// (detached after the session timeout) keep their `Arc<PageFetcher>` but
/// can no longer reach the network, so they never compete with the next
/// session's rate limit.
pub struct CrawlSession {
    id: Uuid,
    fetcher: Arc<PageFetcher>,
    limiter: Arc<RateLimiter>,
    opened_at: Instant,
}

impl CrawlSession {
    /// # Errors
    ///
    /// Returns [`CrawlError::SessionOpen`] if the HTTP client cannot be built.
    pub fn open(
        id: Uuid,
        settings: &CrawlerSettings,
        cache: Arc<ResponseCache>,
    ) -> Result<Self, CrawlError> {
        let limiter = Arc::new(RateLimiter::new(settings.max_requests_per_sec));
        let fetcher = Arc::new(PageFetcher::new(
            &settings.fetcher,
            cache,
            Arc::clone(&limiter),
        )?);
        tracing::info!(
            session_id = %id,
            max_requests_per_sec = settings.max_requests_per_sec,
            "session opened"
        );
        Ok(Self {
            id,
            fetcher,
            limiter,
            opened_at: Instant::now(),
        })
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn fetcher(&self) -> &Arc<PageFetcher> {
        &self.fetcher
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

impl Drop for CrawlSession {
    fn drop(&mut self) {
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = self.opened_at.elapsed().as_millis() as u64;
        self.fetcher.close();
        tracing::info!(session_id = %self.id, elapsed_ms, "session closed");
    }
}
