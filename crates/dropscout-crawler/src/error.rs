use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("max products per source must be at least 1")]
    InvalidCap,

    #[error("a crawl session is already running")]
    SessionActive,

    #[error("failed to open crawl session: {0}")]
    SessionOpen(#[from] dropscout_scraper::ScraperError),
}
