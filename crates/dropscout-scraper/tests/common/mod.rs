//! Shared fixtures for the scraper integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use dropscout_scraper::{
    FetcherSettings, PageFetcher, RateLimiter, ResponseCache, SyntheticRecordGenerator,
    SyntheticSettings, DEFAULT_TTL,
};

/// Fetcher over a fresh temp cache: 5-second timeout, no pacing.
pub fn test_fetcher(max_retries: u32) -> (PageFetcher, TempDir) {
    let dir = TempDir::new().expect("create temp cache dir");
    let cache = Arc::new(ResponseCache::new(dir.path(), DEFAULT_TTL));
    let settings = FetcherSettings {
        timeout_secs: 5,
        user_agent: "dropscout-test/0.1".to_string(),
        max_retries,
        backoff_base_ms: 1,
    };
    let fetcher = PageFetcher::new(&settings, cache, Arc::new(RateLimiter::unlimited()))
        .expect("failed to build test PageFetcher");
    (fetcher, dir)
}

pub fn seeded_generator() -> Arc<SyntheticRecordGenerator> {
    Arc::new(SyntheticRecordGenerator::with_seed(
        SyntheticSettings::default(),
        42,
    ))
}

/// Storefront feed product with one variant per price.
pub fn feed_product(id: i64, title: &str, prices: &[&str]) -> serde_json::Value {
    let variants: Vec<serde_json::Value> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| json!({ "id": id * 10 + i as i64, "price": price, "available": true }))
        .collect();
    json!({
        "id": id,
        "title": title,
        "handle": title.to_lowercase().replace(' ', "-"),
        "body_html": "<p>Made for <b>daily</b> use.</p>",
        "product_type": "Fitness",
        "tags": ["workout", "gym"],
        "images": [{ "src": format!("https://cdn.example.com/{id}.jpg") }],
        "variants": variants,
    })
}

/// Search page with one Amazon-style result card per `(asin, title, price)`.
pub fn amazon_page(cards: &[(&str, &str, &str)]) -> String {
    let body: String = cards
        .iter()
        .map(|(asin, title, price)| {
            format!(
                r#"<div data-component-type="s-search-result" data-asin="{asin}">
                     <h2><a href="/dp/{asin}"><span>{title}</span></a></h2>
                     <span class="a-price"><span class="a-offscreen">{price}</span></span>
                   </div>"#
            )
        })
        .collect();
    format!("<html><body>{body}</body></html>")
}
