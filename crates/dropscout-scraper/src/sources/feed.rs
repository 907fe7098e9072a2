//! Structured storefront feed source (`/products.json`).

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use dropscout_core::ProductRecord;

use super::SourceExtractor;
use crate::cache::CacheBucket;
use crate::client::{extract_store_origin, PageFetcher};
use crate::error::ScraperError;
use crate::normalize::normalize_feed_product;
use crate::placeholder::FEED_JITTER;
use crate::synthetic::SyntheticRecordGenerator;
use crate::types::FeedResponse;

/// Feed paths tried in order; the first that parses wins.
pub const FEED_PATHS: [&str; 3] = [
    "/products.json",
    "/collections/all/products.json",
    "/collections/frontpage/products.json",
];

/// Largest page size storefront feeds accept.
pub const MAX_FEED_LIMIT: usize = 250;

/// Builds the feed URL for `path` on the store root with a `limit` query.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if the store origin is not a valid
/// URL base.
pub fn feed_url(store_url: &str, path: &str, limit: usize) -> Result<String, ScraperError> {
    let origin = extract_store_origin(store_url);
    let mut url =
        reqwest::Url::parse(&format!("{origin}{path}")).map_err(|e| ScraperError::InvalidUrl {
            url: store_url.to_owned(),
            reason: format!("origin \"{origin}\" is not a valid URL base: {e}"),
        })?;
    url.query_pairs_mut()
        .append_pair("limit", &limit.to_string());
    Ok(url.to_string())
}

/// Crawls a list of storefronts through their public product feeds.
///
/// `cap` applies per store. Normalized records are cached per store in the
/// [`CacheBucket::Record`] bucket, keyed by the primary feed URL.
pub struct StorefrontFeedSource {
    stores: Vec<String>,
    synthetic: Arc<SyntheticRecordGenerator>,
}

impl StorefrontFeedSource {
    #[must_use]
    pub fn new(stores: Vec<String>, synthetic: Arc<SyntheticRecordGenerator>) -> Self {
        Self { stores, synthetic }
    }

    #[must_use]
    pub fn stores(&self) -> &[String] {
        &self.stores
    }

    async fn extract_all(&self, fetcher: &PageFetcher, cap: usize) -> Vec<ProductRecord> {
        let mut records = Vec::new();
        for store in &self.stores {
            match self.fetch_store(fetcher, store, cap).await {
                Ok(store_records) => {
                    tracing::debug!(
                        store = store.as_str(),
                        count = store_records.len(),
                        "collected feed products"
                    );
                    records.extend(store_records);
                }
                Err(e) => {
                    tracing::warn!(
                        store = store.as_str(),
                        source = "storefront_feed",
                        error = %e,
                        "storefront feed crawl failed"
                    );
                }
            }
        }
        records
    }

    async fn fetch_store(
        &self,
        fetcher: &PageFetcher,
        store: &str,
        cap: usize,
    ) -> Result<Vec<ProductRecord>, ScraperError> {
        let limit = cap.min(MAX_FEED_LIMIT);
        let records_key = feed_url(store, FEED_PATHS[0], limit)?;
        if let Some(cached) = fetcher
            .cache()
            .get_json::<Vec<ProductRecord>>(&records_key, CacheBucket::Record)
            .await
        {
            tracing::debug!(store, count = cached.len(), "feed records served from cache");
            return Ok(cached.into_iter().take(cap).collect());
        }

        let mut failures = Vec::new();
        for path in FEED_PATHS {
            let url = feed_url(store, path, limit)?;
            match fetcher.fetch_json::<FeedResponse>(&url).await {
                Ok(feed) => {
                    tracing::debug!(store, path, products = feed.products.len(), "feed path answered");
                    let records = self.normalize_feed(feed, store, cap);
                    fetcher
                        .cache()
                        .set_json(&records_key, CacheBucket::Record, &records)
                        .await;
                    return Ok(records);
                }
                Err(e) => {
                    tracing::debug!(store, path, error = %e, "feed path failed");
                    failures.push(format!("{path}: {e}"));
                }
            }
        }

        Err(ScraperError::SourceExhausted {
            source_name: store.to_owned(),
            reason: failures.join("; "),
        })
    }

    /// Decodes and normalizes products one by one; a product that fails
    /// either step is skipped and does not count towards `cap`.
    fn normalize_feed(&self, feed: FeedResponse, store: &str, cap: usize) -> Vec<ProductRecord> {
        feed.decode_products()
            .filter_map(|decoded| {
                let product = match decoded {
                    Ok(product) => product,
                    Err(e) => {
                        tracing::debug!(store, error = %e, "skipping malformed feed product");
                        return None;
                    }
                };
                let jitter = self.synthetic.uniform(-FEED_JITTER, FEED_JITTER);
                match normalize_feed_product(product, store, jitter) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::debug!(store, error = %e, "skipping feed product");
                        None
                    }
                }
            })
            .take(cap)
            .collect()
    }
}

impl SourceExtractor for StorefrontFeedSource {
    fn name(&self) -> &str {
        "storefront_feed"
    }

    fn extract<'a>(
        &'a self,
        fetcher: &'a PageFetcher,
        cap: usize,
    ) -> BoxFuture<'a, Result<Vec<ProductRecord>, ScraperError>> {
        async move { Ok(self.extract_all(fetcher, cap).await) }.boxed()
    }
}
