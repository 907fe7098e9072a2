//! Query-scrape source: runs a platform's fixed search queries and pulls
//! listing cards out of the returned HTML.
//!
//! HTML parsing is synchronous and never held across an `.await`; each page
//! is reduced to [`RawListing`]s before the next fetch.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};

use dropscout_core::{round_to, ProductRecord, SearchPlatform};

use super::profile::{ExtractionStrategy, PlatformProfile};
use super::SourceExtractor;
use crate::cache::CacheBucket;
use crate::client::PageFetcher;
use crate::error::ScraperError;
use crate::parse::{category_from_title, parse_price, tags_from_title};
use crate::placeholder::{search_score, SEARCH_JITTER};
use crate::synthetic::SyntheticRecordGenerator;

/// Titles this short are navigation or badge text, not product names.
const MIN_TITLE_CHARS: usize = 6;
const MAX_TITLE_CHARS: usize = 100;

/// Fields pulled from one listing card before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub title: String,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub native_id: Option<String>,
}

/// Scrapes one search platform, falling back to synthetic records when the
/// markup yields nothing.
pub struct SearchPageSource {
    profile: PlatformProfile,
    search_url: String,
    synthetic: Arc<SyntheticRecordGenerator>,
}

impl SearchPageSource {
    #[must_use]
    pub fn new(platform: SearchPlatform, synthetic: Arc<SyntheticRecordGenerator>) -> Self {
        let profile = PlatformProfile::for_platform(platform);
        Self {
            search_url: profile.search_url.to_owned(),
            profile,
            synthetic,
        }
    }

    /// Replaces the URL prefix queries are appended to.
    #[must_use]
    pub fn with_base_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self
    }

    #[must_use]
    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    fn query_url(&self, query: &str) -> String {
        format!(
            "{}{}",
            self.search_url,
            utf8_percent_encode(query, NON_ALPHANUMERIC)
        )
    }

    async fn extract_all(&self, fetcher: &PageFetcher, cap: usize) -> Vec<ProductRecord> {
        let platform = self.profile.platform.as_str();
        let per_query = self.profile.per_query_cap(cap);
        let mut records: Vec<ProductRecord> = Vec::new();
        let mut seen_titles: HashSet<String> = HashSet::new();

        for query in self.profile.queries {
            if records.len() >= cap {
                break;
            }
            let url = self.query_url(query);

            let listings = match fetcher.fetch_text(&url, CacheBucket::RawPage).await {
                Ok(body) => parse_listings(&self.profile, &body, &url),
                Err(e) => {
                    tracing::warn!(
                        source = platform,
                        query,
                        error = %e,
                        "search page fetch failed"
                    );
                    None
                }
            };

            match listings {
                Some((selector, listings)) => {
                    let before = records.len();
                    for listing in listings {
                        if records.len() - before >= per_query {
                            break;
                        }
                        if !seen_titles.insert(listing.title.to_lowercase()) {
                            continue;
                        }
                        records.push(self.listing_to_record(listing, &url));
                    }
                    tracing::debug!(
                        source = platform,
                        query,
                        selector,
                        count = records.len() - before,
                        "extracted search listings"
                    );
                }
                None => {
                    tracing::info!(
                        source = platform,
                        query,
                        "no listing selector matched, using synthetic fallback"
                    );
                    records.extend(self.fallback(per_query));
                }
            }
        }

        let floor = self.profile.min_yield.min(cap);
        if records.len() < floor {
            tracing::info!(
                source = platform,
                count = records.len(),
                floor,
                "search yield below minimum, topping up"
            );
            records.extend(self.fallback(cap - records.len()));
        }

        records.truncate(cap);
        records
    }

    fn fallback(&self, count: usize) -> Vec<ProductRecord> {
        self.synthetic.batch_for(
            self.profile.store_name(),
            self.profile.supplier.map(|(platform, _)| platform),
            count,
        )
    }

    /// Normalizes a listing scraped from `page_url`.
    fn listing_to_record(&self, listing: RawListing, page_url: &str) -> ProductRecord {
        let profile = &self.profile;
        let (low, high) = profile.default_price;
        let price = listing
            .price
            .unwrap_or_else(|| round_to(self.synthetic.uniform(low, high), 2));

        let source_url = match (&listing.native_id, profile.product_url) {
            (Some(native_id), Some(prefix)) => format!("{prefix}{native_id}"),
            _ => listing.link.clone().unwrap_or_else(|| page_url.to_owned()),
        };
        let id = listing_id(profile.platform, &listing.title, &source_url);

        let mut record = ProductRecord::new(
            id,
            listing.title.as_str(),
            price,
            category_from_title(&listing.title),
            profile.store_name(),
        );
        record.description = Some(format!("{}{}", profile.description_prefix, listing.title));
        let (markup_low, markup_high) = profile.compare_markup;
        record.compare_price = Some(round_to(
            price * self.synthetic.uniform(markup_low, markup_high),
            2,
        ));
        record.tags = tags_from_title(&listing.title).into_iter().collect();
        record.image_url = Some(
            listing
                .image
                .unwrap_or_else(|| self.synthetic.placeholder_image()),
        );
        if let Some((supplier, ratio)) = profile.supplier {
            record.supplier_links.insert(supplier, source_url.clone());
            record
                .supplier_prices
                .insert(supplier, round_to(price * ratio, 2));
        }
        record.source_url = Some(source_url);

        self.synthetic
            .engagement_for(&listing.title)
            .apply_to(&mut record);

        let jitter = self.synthetic.uniform(-SEARCH_JITTER, SEARCH_JITTER);
        record.set_placeholder_score(search_score(price, &listing.title, jitter));
        record
    }
}

impl SourceExtractor for SearchPageSource {
    fn name(&self) -> &str {
        self.profile.platform.as_str()
    }

    fn extract<'a>(
        &'a self,
        fetcher: &'a PageFetcher,
        cap: usize,
    ) -> BoxFuture<'a, Result<Vec<ProductRecord>, ScraperError>> {
        async move { Ok(self.extract_all(fetcher, cap).await) }.boxed()
    }
}

/// Runs the profile's selector strategies over `html` in order and returns
/// the first that yields at least one titled listing, with its selector.
///
/// `None` means the plan reached [`ExtractionStrategy::SyntheticFallback`].
#[must_use]
pub fn parse_listings(
    profile: &PlatformProfile,
    html: &str,
    page_url: &str,
) -> Option<(&'static str, Vec<RawListing>)> {
    let document = Html::parse_document(html);
    let base = reqwest::Url::parse(page_url).ok();

    for strategy in profile.strategies() {
        let css = match strategy {
            ExtractionStrategy::Selector(css) => css,
            ExtractionStrategy::SyntheticFallback => return None,
        };
        let Ok(container) = Selector::parse(css) else {
            tracing::debug!(selector = css, "skipping unparseable container selector");
            continue;
        };

        let listings: Vec<RawListing> = document
            .select(&container)
            .filter_map(|card| listing_from_card(profile, card, base.as_ref()))
            .collect();
        if !listings.is_empty() {
            return Some((css, listings));
        }
    }
    None
}

fn listing_from_card(
    profile: &PlatformProfile,
    card: ElementRef<'_>,
    base: Option<&reqwest::Url>,
) -> Option<RawListing> {
    let title = card_title(profile, card)?;
    let price = first_match(profile.prices, card)
        .into_iter()
        .flatten()
        .find_map(|el| parse_price(&element_text(el)));
    let image = card_image(profile, card).map(|src| resolve(&src, base));
    let link = first_match(profile.links, card)
        .into_iter()
        .flatten()
        .find_map(|el| el.value().attr("href"))
        .filter(|href| !href.trim().is_empty() && !href.starts_with('#'))
        .map(|href| resolve(href.trim(), base));
    let native_id = profile
        .native_id_attr
        .and_then(|attr| card.value().attr(attr))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned);

    Some(RawListing {
        title,
        price,
        image,
        link,
        native_id,
    })
}

/// First title selector match with at least [`MIN_TITLE_CHARS`]; the
/// `title` attribute wins over element text.
fn card_title(profile: &PlatformProfile, card: ElementRef<'_>) -> Option<String> {
    profile.titles.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        let el = card.select(&selector).next()?;
        let text = el
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or_else(|| element_text(el), str::to_owned);
        (text.chars().count() >= MIN_TITLE_CHARS)
            .then(|| text.chars().take(MAX_TITLE_CHARS).collect())
    })
}

/// Image source preferring the platform CDN, skipping inline `data:` URIs.
fn card_image(profile: &PlatformProfile, card: ElementRef<'_>) -> Option<String> {
    let mut candidates = Vec::new();
    for css in profile.images {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for el in card.select(&selector) {
            candidates.extend(
                profile
                    .image_attrs
                    .iter()
                    .filter_map(|attr| el.value().attr(attr))
                    .map(str::trim)
                    .filter(|src| !src.is_empty() && !src.starts_with("data:"))
                    .map(str::to_owned),
            );
        }
    }
    let on_cdn = candidates
        .iter()
        .position(|src| profile.image_hosts.iter().any(|host| src.contains(host)));
    match on_cdn {
        Some(idx) => Some(candidates.swap_remove(idx)),
        None => candidates.into_iter().next(),
    }
}

/// Elements matched by the first selector in `chain` that matches anything.
fn first_match<'a>(chain: &[&str], card: ElementRef<'a>) -> Option<Vec<ElementRef<'a>>> {
    chain.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        let matched: Vec<ElementRef<'a>> = card.select(&selector).collect();
        (!matched.is_empty()).then_some(matched)
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves protocol-relative and relative references against the page.
fn resolve(reference: &str, base: Option<&reqwest::Url>) -> String {
    if let Some(rest) = reference.strip_prefix("//") {
        return format!("https://{rest}");
    }
    match base.map(|b| b.join(reference)) {
        Some(Ok(url)) => url.to_string(),
        _ => reference.to_owned(),
    }
}

/// `<platform>_<12 hex chars of sha256(title + url)>`.
fn listing_id(platform: SearchPlatform, title: &str, url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(format!("{title}{url}").as_bytes()));
    format!("{}_{}", platform.as_str(), &digest[..12])
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
