pub mod cache;
pub mod client;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod placeholder;
pub mod rate_limit;
pub mod sources;
pub mod synthetic;
pub mod types;

pub use cache::{BucketStats, CacheBucket, ResponseCache, DEFAULT_TTL};
pub use client::{FetcherSettings, PageFetcher};
pub use error::ScraperError;
pub use normalize::normalize_feed_product;
pub use rate_limit::{retry_with_backoff, RateLimiter};
pub use sources::{
    ExtractionStrategy, PlatformProfile, RawListing, SearchPageSource, SourceExtractor,
    StorefrontFeedSource,
};
pub use synthetic::{Engagement, SupplierOdds, SyntheticRecordGenerator, SyntheticSettings};
pub use types::{FeedProduct, FeedResponse, FeedVariant};
