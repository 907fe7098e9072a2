use std::path::PathBuf;
use std::time::Duration;

use dropscout_core::AppConfig;
use dropscout_scraper::{FetcherSettings, DEFAULT_TTL};

/// Runtime knobs for a [`crate::CrawlOrchestrator`].
#[derive(Debug, Clone)]
pub struct CrawlerSettings {
    pub fetcher: FetcherSettings,
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    /// Non-positive disables pacing.
    pub max_requests_per_sec: f64,
    pub max_concurrent_sources: usize,
    pub session_timeout: Duration,
    pub min_viable_products: usize,
}

impl CrawlerSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            fetcher: FetcherSettings {
                timeout_secs: config.scraper_request_timeout_secs,
                user_agent: config.scraper_user_agent.clone(),
                max_retries: config.scraper_max_retries,
                backoff_base_ms: config.scraper_retry_backoff_base_ms,
            },
            cache_dir: config.cache_dir.clone(),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            max_requests_per_sec: config.max_requests_per_sec,
            max_concurrent_sources: config.max_concurrent_sources.max(1),
            session_timeout: Duration::from_secs(config.session_timeout_secs),
            min_viable_products: config.min_viable_products,
        }
    }
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            fetcher: FetcherSettings::default(),
            cache_dir: PathBuf::from("./cache"),
            cache_ttl: DEFAULT_TTL,
            max_requests_per_sec: 2.0,
            max_concurrent_sources: 4,
            session_timeout: Duration::from_secs(300),
            min_viable_products: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_app_config_maps_every_field() {
        let config = AppConfig {
            env: dropscout_core::Environment::Test,
            log_level: "debug".into(),
            sources_path: "./config/sources.yaml".into(),
            store_path: "./data/products.json".into(),
            cache_dir: "/tmp/dropscout-cache".into(),
            cache_ttl_secs: 60,
            scraper_request_timeout_secs: 12,
            scraper_user_agent: "ua/1".into(),
            scraper_max_retries: 4,
            scraper_retry_backoff_base_ms: 250,
            max_requests_per_sec: 0.5,
            max_concurrent_sources: 0,
            session_timeout_secs: 90,
            min_viable_products: 25,
        };

        let settings = CrawlerSettings::from_app_config(&config);

        assert_eq!(settings.fetcher.timeout_secs, 12);
        assert_eq!(settings.fetcher.user_agent, "ua/1");
        assert_eq!(settings.fetcher.max_retries, 4);
        assert_eq!(settings.fetcher.backoff_base_ms, 250);
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/dropscout-cache"));
        assert_eq!(settings.cache_ttl, Duration::from_secs(60));
        assert_eq!(settings.max_concurrent_sources, 1);
        assert_eq!(settings.session_timeout, Duration::from_secs(90));
        assert_eq!(settings.min_viable_products, 25);
    }
}
