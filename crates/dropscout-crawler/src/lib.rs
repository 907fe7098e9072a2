//! Crawl orchestration: fans out to every configured source under a shared
//! rate limiter, isolates failures, tops up thin results with synthetic
//! filler, scores, and persists.

pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod session;
pub mod settings;

pub use error::CrawlError;
pub use orchestrator::{build_sources, CrawlOrchestrator, SessionGuard};
pub use progress::{CrawlProgress, CrawlStatus, SourceOutcome, SourceReport};
pub use session::CrawlSession;
pub use settings::CrawlerSettings;
