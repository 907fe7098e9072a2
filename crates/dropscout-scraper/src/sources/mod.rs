//! Source extractor abstractions.
//!
//! A source turns some external listing surface into [`ProductRecord`]s.
//! Extractors swallow and log their own failures: a source that cannot
//! reach anything returns an empty list (or synthetic fallback) rather than
//! an error, so one bad source never sinks a crawl session.

mod feed;
mod profile;
mod search;

use futures::future::BoxFuture;

use dropscout_core::ProductRecord;

use crate::client::PageFetcher;
use crate::error::ScraperError;

pub use feed::{feed_url, StorefrontFeedSource, FEED_PATHS, MAX_FEED_LIMIT};
pub use profile::{ExtractionStrategy, PlatformProfile};
pub use search::{parse_listings, RawListing, SearchPageSource};

/// Capability shared by every product source.
pub trait SourceExtractor: Send + Sync {
    /// Stable label used in logs and crawl progress reports.
    fn name(&self) -> &str;

    /// Extracts at most `cap` records per unit of work (store or query set),
    /// fetching through `fetcher`.
    fn extract<'a>(
        &'a self,
        fetcher: &'a PageFetcher,
        cap: usize,
    ) -> BoxFuture<'a, Result<Vec<ProductRecord>, ScraperError>>;
}
