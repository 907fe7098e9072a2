//! Session lifecycle and fan-out over the configured sources.
//!
//! ### Lifecycle
//! `idle → running → completed`. [`CrawlOrchestrator::start`] claims the
//! single session slot; a second call while a session runs is rejected with
//! [`CrawlError::SessionActive`]. The returned [`SessionGuard`] releases the
//! slot on drop and closes out an abandoned session.
//!
//! ### Fan-out
//! Each source runs as its own tokio task, bounded by a semaphore and paced
//! by the session's rate limiter. Errors and panics are contained per
//! source. Sources still running at the session deadline are marked
//! `timed_out` and left to finish detached; results are aggregated in
//! configuration order regardless of completion order.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use uuid::Uuid;

use dropscout_core::{ProductRecord, SourcesFile};
use dropscout_scoring::ScoringEngine;
use dropscout_scraper::{
    PageFetcher, RateLimiter, ResponseCache, SearchPageSource, SourceExtractor,
    StorefrontFeedSource, SyntheticRecordGenerator,
};
use dropscout_store::ProductStore;

use crate::error::CrawlError;
use crate::progress::{CrawlProgress, SourceOutcome, SourceReport};
use crate::session::CrawlSession;
use crate::settings::CrawlerSettings;

type SourceResult = Result<Vec<ProductRecord>, String>;

/// One search source per configured platform, then a single feed source over
/// every configured store.
#[must_use]
pub fn build_sources(
    sources: &SourcesFile,
    synthetic: &Arc<SyntheticRecordGenerator>,
) -> Vec<Arc<dyn SourceExtractor>> {
    let mut built: Vec<Arc<dyn SourceExtractor>> = sources
        .search_platforms
        .iter()
        .map(|platform| {
            Arc::new(SearchPageSource::new(*platform, Arc::clone(synthetic)))
                as Arc<dyn SourceExtractor>
        })
        .collect();
    if !sources.feed_stores.is_empty() {
        built.push(Arc::new(StorefrontFeedSource::new(
            sources.feed_stores.clone(),
            Arc::clone(synthetic),
        )));
    }
    built
}

pub struct CrawlOrchestrator {
    settings: CrawlerSettings,
    sources: Vec<Arc<dyn SourceExtractor>>,
    cache: Arc<ResponseCache>,
    synthetic: Arc<SyntheticRecordGenerator>,
    scoring: ScoringEngine,
    store: Arc<dyn ProductStore>,
    running: Arc<AtomicBool>,
    progress: Arc<Mutex<CrawlProgress>>,
}

impl CrawlOrchestrator {
    #[must_use]
    pub fn new(
        settings: CrawlerSettings,
        sources: Vec<Arc<dyn SourceExtractor>>,
        synthetic: Arc<SyntheticRecordGenerator>,
        store: Arc<dyn ProductStore>,
    ) -> Self {
        let cache = Arc::new(ResponseCache::new(&settings.cache_dir, settings.cache_ttl));
        Self {
            settings,
            sources,
            cache,
            synthetic,
            scoring: ScoringEngine::default(),
            store,
            running: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(Mutex::new(CrawlProgress::default())),
        }
    }

    /// Wires the platforms and stores from a sources file.
    #[must_use]
    pub fn from_sources_file(
        settings: CrawlerSettings,
        sources: &SourcesFile,
        store: Arc<dyn ProductStore>,
    ) -> Self {
        let synthetic = Arc::new(SyntheticRecordGenerator::default());
        let built = build_sources(sources, &synthetic);
        Self::new(settings, built, synthetic, store)
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringEngine) -> Self {
        self.scoring = scoring;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_owned()).collect()
    }

    /// Snapshot of the current or most recent session.
    #[must_use]
    pub fn get_progress(&self) -> CrawlProgress {
        lock(&self.progress).clone()
    }

    /// Claims the session slot and resets progress for
    /// `expected_source_count` sources.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::SessionActive`] while another session holds the
    /// slot.
    pub fn start(&self, expected_source_count: usize) -> Result<SessionGuard, CrawlError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CrawlError::SessionActive);
        }
        let fresh = CrawlProgress::begin(expected_source_count);
        let id = fresh.session_id.unwrap_or_else(Uuid::new_v4);
        *lock(&self.progress) = fresh;
        Ok(SessionGuard {
            id,
            running: Arc::clone(&self.running),
            progress: Arc::clone(&self.progress),
        })
    }

    /// Crawls every source with at most `cap` records each, tops up with
    /// synthetic filler if the yield is below the viable minimum, and scores
    /// everything the engine has not scored yet.
    ///
    /// Source failures never fail the crawl.
    ///
    /// # Errors
    ///
    /// - [`CrawlError::InvalidCap`] if `cap` is zero.
    /// - [`CrawlError::SessionActive`] if a session is already running.
    /// - [`CrawlError::SessionOpen`] if the HTTP client cannot be built.
    pub async fn run_crawl(&self, cap: usize) -> Result<Vec<ProductRecord>, CrawlError> {
        if cap == 0 {
            return Err(CrawlError::InvalidCap);
        }
        let guard = self.start(self.sources.len())?;
        let session = CrawlSession::open(guard.id(), &self.settings, Arc::clone(&self.cache))?;

        {
            let mut progress = lock(&self.progress);
            progress.sources = self
                .sources
                .iter()
                .map(|source| SourceReport {
                    name: source.name().to_owned(),
                    outcome: SourceOutcome::Pending,
                    yielded: 0,
                    error: None,
                })
                .collect();
        }

        let batches = self.extract_all(&session, cap).await;
        let mut records = dedupe(batches);

        let live = records.len();
        if live < self.settings.min_viable_products {
            let missing = cap.saturating_sub(live);
            tracing::info!(
                live,
                min_viable = self.settings.min_viable_products,
                filler = missing,
                "live yield below minimum, adding synthetic filler"
            );
            records.extend(self.synthetic.fill(missing));
        }

        let mut scored = 0usize;
        for record in records.iter_mut().filter(|r| !r.is_engine_scored()) {
            self.scoring.apply(record);
            scored += 1;
        }

        guard.finish(records.len());
        tracing::info!(
            session_id = %session.id(),
            total = records.len(),
            live,
            scored,
            "crawl completed"
        );
        Ok(records)
    }

    /// [`Self::run_crawl`], then replaces the store's contents with the
    /// result.
    ///
    /// # Errors
    ///
    /// As [`Self::run_crawl`].
    pub async fn run_full_crawl(&self, cap: usize) -> Result<Vec<ProductRecord>, CrawlError> {
        let records = self.run_crawl(cap).await?;
        let stored = self.store.replace_all(records.clone());
        tracing::info!(stored, "product store replaced");
        Ok(records)
    }

    async fn extract_all(&self, session: &CrawlSession, cap: usize) -> Vec<Vec<ProductRecord>> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_sources.max(1)));

        let mut pending: FuturesUnordered<_> = self
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let handle = tokio::spawn(run_source(
                    Arc::clone(source),
                    Arc::clone(session.fetcher()),
                    Arc::clone(session.limiter()),
                    Arc::clone(&semaphore),
                    cap,
                ));
                async move { (index, handle.await) }
            })
            .collect();

        let mut batches: Vec<Vec<ProductRecord>> = vec![Vec::new(); self.sources.len()];
        let deadline = tokio::time::Instant::now() + self.settings.session_timeout;

        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((index, joined))) => {
                    if let Some(records) = self.settle(index, joined) {
                        batches[index] = records;
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    self.time_out_pending();
                    break;
                }
            }
        }
        // Dropping the remaining join handles detaches their tasks.
        drop(pending);
        batches
    }

    fn settle(
        &self,
        index: usize,
        joined: Result<SourceResult, JoinError>,
    ) -> Option<Vec<ProductRecord>> {
        let name = self.sources[index].name();
        let mut progress = lock(&self.progress);
        match joined {
            Ok(Ok(records)) => {
                progress.settle(index, SourceOutcome::Succeeded, records.len(), None);
                Some(records)
            }
            Ok(Err(message)) => {
                tracing::warn!(source = name, error = %message, "source failed");
                progress.settle(index, SourceOutcome::Failed, 0, Some(message));
                None
            }
            Err(e) => {
                tracing::error!(source = name, error = %e, "source task aborted");
                progress.settle(index, SourceOutcome::Failed, 0, Some(e.to_string()));
                None
            }
        }
    }

    fn time_out_pending(&self) {
        let mut progress = lock(&self.progress);
        let timed_out: Vec<usize> = progress
            .sources
            .iter()
            .enumerate()
            .filter(|(_, report)| report.outcome == SourceOutcome::Pending)
            .map(|(index, _)| index)
            .collect();
        for index in timed_out {
            tracing::warn!(
                source = self.sources[index].name(),
                timeout_secs = self.settings.session_timeout.as_secs(),
                "source still running at session deadline, detaching"
            );
            progress.settle(index, SourceOutcome::TimedOut, 0, None);
        }
    }
}

/// Marks a claimed session slot. Dropping it releases the slot; a session
/// dropped before [`SessionGuard::finish`] is closed out as completed.
pub struct SessionGuard {
    id: Uuid,
    running: Arc<AtomicBool>,
    progress: Arc<Mutex<CrawlProgress>>,
}

impl SessionGuard {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn finish(self, total_products: usize) {
        lock(&self.progress).complete(total_products);
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        {
            let mut progress = lock(&self.progress);
            if progress.is_running() {
                tracing::warn!(
                    completed_sources = progress.completed_sources,
                    total_sources = progress.total_sources,
                    "crawl session abandoned before completion"
                );
                let partial = progress.total_products;
                progress.complete(partial);
            }
        }
        self.running.store(false, Ordering::Release);
    }
}

async fn run_source(
    source: Arc<dyn SourceExtractor>,
    fetcher: Arc<PageFetcher>,
    limiter: Arc<RateLimiter>,
    semaphore: Arc<Semaphore>,
    cap: usize,
) -> SourceResult {
    // Never closed, so acquisition cannot fail.
    let _permit = semaphore.acquire_owned().await.ok();
    limiter.wait().await;

    let name = source.name().to_owned();
    let outcome = AssertUnwindSafe(async { source.extract(&fetcher, cap).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(records)) => {
            tracing::info!(source = %name, count = records.len(), "source finished");
            Ok(records)
        }
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(source = %name, panic = %message, "source extractor panicked");
            Err(format!("extractor panicked: {message}"))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_owned())
}

/// Concatenates batches in order, keeping the first record for each id.
fn dedupe(batches: Vec<Vec<ProductRecord>>) -> Vec<ProductRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();
    let mut dropped = 0usize;
    for record in batches.into_iter().flatten() {
        if seen.insert(record.id.clone()) {
            records.push(record);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, "dropped records with duplicate ids");
    }
    records
}

fn lock(progress: &Mutex<CrawlProgress>) -> MutexGuard<'_, CrawlProgress> {
    progress.lock().unwrap_or_else(PoisonError::into_inner)
}
