//! Request pacing and retry utilities shared by every source extractor.
//!
//! [`RateLimiter`] enforces a minimum gap between outbound requests for a
//! whole crawl session. [`retry_with_backoff`] retries transient failures
//! (network errors, 429, 5xx) with exponential backoff; everything else is
//! propagated immediately.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ScraperError;

/// Paces callers so that consecutive permitted calls are at least
/// `1 / max_rate` seconds apart.
///
/// The last-call timestamp is held behind an async mutex for the duration of
/// the sleep, so concurrent callers queue up and are released one at a time.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Option<Duration>,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter permitting at most `max_rate` calls per second.
    ///
    /// A non-positive or non-finite rate disables pacing entirely.
    #[must_use]
    pub fn new(max_rate: f64) -> Self {
        let min_interval = (max_rate.is_finite() && max_rate > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / max_rate));
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// A limiter that never waits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(0.0)
    }

    #[must_use]
    pub fn min_interval(&self) -> Option<Duration> {
        self.min_interval
    }

    /// Suspends until the next request slot is available, then claims it.
    pub async fn wait(&self) {
        let Some(min_gap) = self.min_interval else {
            return;
        };

        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < min_gap {
                tokio::time::sleep(min_gap.saturating_sub(elapsed)).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// 429s, network failures and 5xx statuses are worth another attempt;
/// 404s, other 4xx and parse failures are not.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Runs `operation`, retrying transient failures up to `max_retries` times.
///
/// Retry `n` (zero-based) sleeps `backoff_base_ms * 2^n` first, so a base of
/// 500 ms waits 500, 1000, 2000 ms. Non-retriable errors and the error from
/// the final attempt are returned as-is.
///
/// # Errors
///
/// Returns the first non-retriable error, or the last error once retries
/// run out.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries && is_retriable(&err) => err,
            Err(err) => return Err(err),
        };

        let delay_ms = backoff_base_ms.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited(retry_after_secs: u64) -> ScraperError {
        ScraperError::RateLimited {
            domain: "test.example.com".to_owned(),
            retry_after_secs,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_wait_is_immediate() {
        let limiter = RateLimiter::new(2.0);
        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_waits_are_spaced_by_min_interval() {
        let limiter = RateLimiter::new(2.0);
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(4.0));
        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.wait().await;
                    Instant::now()
                })
            })
            .collect();

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(250));
        }
        assert!(start.elapsed() >= Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_after_interval_already_elapsed() {
        let limiter = RateLimiter::new(1.0);
        limiter.wait().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        let before = Instant::now();
        limiter.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[test]
    fn non_positive_rate_disables_pacing() {
        assert!(RateLimiter::new(0.0).min_interval().is_none());
        assert!(RateLimiter::new(-3.0).min_interval().is_none());
        assert!(RateLimiter::new(f64::NAN).min_interval().is_none());
        assert_eq!(
            RateLimiter::new(4.0).min_interval(),
            Some(Duration::from_millis(250))
        );
    }

    /// Runs `retry_with_backoff` over a scripted sequence of outcomes and
    /// returns the result plus the number of attempts made.
    async fn run_script(
        max_retries: u32,
        script: Vec<Result<u32, ScraperError>>,
    ) -> (Result<u32, ScraperError>, u32) {
        let attempts = Arc::new(AtomicU32::new(0));
        let script = Arc::new(std::sync::Mutex::new(script.into_iter()));
        let result = retry_with_backoff(max_retries, 0, || {
            let attempts = Arc::clone(&attempts);
            let script = Arc::clone(&script);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                let next = script.lock().unwrap().next();
                next.unwrap_or(Ok(0))
            }
        })
        .await;
        (result, attempts.load(Ordering::SeqCst))
    }

    fn status(code: u16) -> ScraperError {
        ScraperError::UnexpectedStatus {
            status: code,
            url: "https://shop.example.com/products.json".to_owned(),
        }
    }

    #[tokio::test]
    async fn first_success_is_returned_without_retry() {
        let (result, attempts) = run_script(3, vec![Ok(42)]).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn rate_limited_attempts_are_retried() {
        let (result, attempts) =
            run_script(3, vec![Err(rate_limited(0)), Err(rate_limited(0)), Ok(99)]).await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn server_errors_exhaust_retries() {
        let (result, attempts) =
            run_script(2, vec![Err(status(503)), Err(status(502)), Err(status(500))]).await;
        assert_eq!(attempts, 3);
        assert!(matches!(
            result,
            Err(ScraperError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn client_errors_fail_fast() {
        let (result, attempts) = run_script(3, vec![Err(status(403))]).await;
        assert_eq!(attempts, 1);
        assert!(result.is_err());

        let missing = ScraperError::NotFound {
            url: "https://shop.example.com/collections/all/products.json".to_owned(),
        };
        let (result, attempts) = run_script(3, vec![Err(missing)]).await;
        assert_eq!(attempts, 1);
        assert!(matches!(result, Err(ScraperError::NotFound { .. })));
    }

    #[tokio::test]
    async fn parse_failures_are_not_retried() {
        let parse = ScraperError::Parse {
            context: "search page".to_owned(),
            reason: "no listing containers".to_owned(),
        };
        let (_, attempts) = run_script(3, vec![Err(parse)]).await;
        assert_eq!(attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_exponentially() {
        let start = Instant::now();
        let result = retry_with_backoff(2, 100, || async {
            Err::<u32, ScraperError>(rate_limited(0))
        })
        .await;
        assert!(result.is_err());
        // 100 ms + 200 ms
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
