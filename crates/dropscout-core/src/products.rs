use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Id prefix carried by every record produced by the synthetic filler.
///
/// Downstream consumers use it to separate extracted data from templated
/// filler; see [`ProductRecord::is_synthetic`].
pub const SYNTHETIC_ID_PREFIX: &str = "synthetic_";

/// Closed set of product categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Gadgets,
    Home,
    Fashion,
    Beauty,
    Fitness,
    Pets,
    Kids,
    Automotive,
    Garden,
    Sports,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Gadgets,
        Category::Home,
        Category::Fashion,
        Category::Beauty,
        Category::Fitness,
        Category::Pets,
        Category::Kids,
        Category::Automotive,
        Category::Garden,
        Category::Sports,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Gadgets => "gadgets",
            Category::Home => "home",
            Category::Fashion => "fashion",
            Category::Beauty => "beauty",
            Category::Fitness => "fitness",
            Category::Pets => "pets",
            Category::Kids => "kids",
            Category::Automotive => "automotive",
            Category::Garden => "garden",
            Category::Sports => "sports",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// Wholesale platforms a product can be sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SupplierPlatform {
    #[serde(rename = "aliexpress")]
    AliExpress,
    #[serde(rename = "temu")]
    Temu,
    #[serde(rename = "1688")]
    Shop1688,
}

impl SupplierPlatform {
    pub const ALL: [SupplierPlatform; 3] = [
        SupplierPlatform::AliExpress,
        SupplierPlatform::Temu,
        SupplierPlatform::Shop1688,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SupplierPlatform::AliExpress => "aliexpress",
            SupplierPlatform::Temu => "temu",
            SupplierPlatform::Shop1688 => "1688",
        }
    }
}

impl std::fmt::Display for SupplierPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a record's current `score` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    /// No score assigned yet; `score` is `0.0`.
    #[default]
    Unscored,
    /// Lightweight inline estimate set by an extractor, pending the full pass.
    Placeholder,
    /// Composite score from the scoring engine.
    Engine,
}

/// A Facebook ad observed for a product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdMetric {
    pub id: String,
    pub text: String,
    pub engagement_rate: f64,
    pub reach: u64,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: Option<f64>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

/// A TikTok video mentioning a product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetric {
    pub id: String,
    pub url: String,
    pub description: String,
    pub views: u64,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub hashtags: Vec<String>,
}

/// One sample of search interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: u32,
}

/// Search-trend signal for a product keyword.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendSignal {
    pub keyword: String,
    /// Relative search volume in `[0, 100]`.
    pub trend_score: f64,
    pub interest_over_time: Vec<TrendPoint>,
    pub related_queries: Vec<String>,
    /// Region code → intensity in `[0, 100]`.
    pub geographic_interest: BTreeMap<String, u32>,
}

/// A candidate product from any source, normalized to one shape.
///
/// Optional signals (`facebook_ads`, `tiktok_mentions`, `trend_data`,
/// `supplier_prices`, `similar_stores`) default to empty; the scoring engine
/// applies a fixed default per absent signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Source-prefixed id, e.g. `"shopify_6789012345678"`.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub compare_price: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Host or marketplace the record was found on, e.g. `"aliexpress.com"`.
    pub source_store: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub supplier_links: BTreeMap<SupplierPlatform, String>,
    #[serde(default)]
    pub supplier_prices: BTreeMap<SupplierPlatform, f64>,
    #[serde(default)]
    pub facebook_ads: Vec<AdMetric>,
    #[serde(default)]
    pub tiktok_mentions: Vec<VideoMetric>,
    #[serde(default)]
    pub trend_data: Option<TrendSignal>,
    /// Competitor stores selling the same product.
    #[serde(default)]
    pub similar_stores: Vec<String>,
    /// Winning score in `[0, 100]`.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub score_kind: ScoreKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl ProductRecord {
    /// Creates an unscored record with every optional field empty.
    ///
    /// Negative or non-finite prices are stored as `0.0`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        price: f64,
        category: Category,
        source_store: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            price: sanitize_price(price),
            compare_price: None,
            currency: default_currency(),
            category,
            tags: BTreeSet::new(),
            source_store: source_store.into(),
            source_url: None,
            image_url: None,
            supplier_links: BTreeMap::new(),
            supplier_prices: BTreeMap::new(),
            facebook_ads: Vec::new(),
            tiktok_mentions: Vec::new(),
            trend_data: None,
            similar_stores: Vec::new(),
            score: 0.0,
            score_kind: ScoreKind::Unscored,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the record came from the synthetic filler.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.id.starts_with(SYNTHETIC_ID_PREFIX)
    }

    /// Returns `true` once the scoring engine has assigned the score.
    #[must_use]
    pub fn is_engine_scored(&self) -> bool {
        self.score_kind == ScoreKind::Engine
    }

    /// Lowest known supplier price, if any supplier is listed.
    #[must_use]
    pub fn min_supplier_price(&self) -> Option<f64> {
        self.supplier_prices.values().copied().reduce(f64::min)
    }

    /// Sets an extractor's inline estimate. Ignored once the engine has scored
    /// the record.
    pub fn set_placeholder_score(&mut self, score: f64) {
        if self.is_engine_scored() {
            return;
        }
        self.score = clamp_score(score);
        self.score_kind = ScoreKind::Placeholder;
    }

    /// Assigns the composite engine score. This is the only mutation allowed
    /// after a record leaves its extractor.
    pub fn assign_score(&mut self, score: f64) {
        self.score = clamp_score(score);
        self.score_kind = ScoreKind::Engine;
        self.updated_at = Utc::now();
    }
}

/// Clamps a score into `[0, 100]`, mapping NaN to `0.0`.
#[must_use]
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

fn sanitize_price(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
        price
    } else {
        0.0
    }
}

/// Rounds to `decimals` places using half-away-from-zero.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ProductRecord {
        ProductRecord::new(id, "LED Flame Speaker", 29.99, Category::Gadgets, "example.com")
    }

    #[test]
    fn new_record_is_unscored_with_usd_currency() {
        let r = record("shopify_1");
        assert_eq!(r.score_kind, ScoreKind::Unscored);
        assert_eq!(r.score, 0.0);
        assert_eq!(r.currency, "USD");
        assert!(r.tags.is_empty());
    }

    #[test]
    fn negative_price_is_stored_as_zero() {
        let r = ProductRecord::new("x_1", "t", -4.0, Category::Home, "s");
        assert_eq!(r.price, 0.0);
        let r = ProductRecord::new("x_2", "t", f64::NAN, Category::Home, "s");
        assert_eq!(r.price, 0.0);
    }

    #[test]
    fn synthetic_prefix_is_detected() {
        assert!(record("synthetic_aliexpress_ab12").is_synthetic());
        assert!(!record("aliexpress_123").is_synthetic());
    }

    #[test]
    fn assign_score_clamps_and_marks_engine() {
        let mut r = record("shopify_1");
        r.assign_score(140.0);
        assert_eq!(r.score, 100.0);
        assert!(r.is_engine_scored());
        r.assign_score(f64::NAN);
        assert_eq!(r.score, 0.0);
    }

    #[test]
    fn placeholder_does_not_override_engine_score() {
        let mut r = record("shopify_1");
        r.set_placeholder_score(71.5);
        assert_eq!(r.score_kind, ScoreKind::Placeholder);
        r.assign_score(40.0);
        r.set_placeholder_score(90.0);
        assert_eq!(r.score, 40.0);
        assert_eq!(r.score_kind, ScoreKind::Engine);
    }

    #[test]
    fn min_supplier_price_picks_lowest() {
        let mut r = record("shopify_1");
        assert_eq!(r.min_supplier_price(), None);
        r.supplier_prices.insert(SupplierPlatform::Temu, 15.0);
        r.supplier_prices.insert(SupplierPlatform::AliExpress, 12.5);
        assert_eq!(r.min_supplier_price(), Some(12.5));
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("Fitness".parse::<Category>().unwrap(), Category::Fitness);
        assert!("toys".parse::<Category>().is_err());
    }

    #[test]
    fn deserializes_partial_record_with_defaults() {
        let json = serde_json::json!({
            "id": "temu_1",
            "title": "Phone Case",
            "price": 4.5,
            "source_store": "temu.com",
            "supplier_prices": { "1688": 1.2 },
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        });
        let r: ProductRecord = serde_json::from_value(json).unwrap();
        assert_eq!(r.category, Category::Gadgets);
        assert_eq!(r.currency, "USD");
        assert_eq!(r.supplier_prices[&SupplierPlatform::Shop1688], 1.2);
        assert!(r.trend_data.is_none());
        assert_eq!(r.score_kind, ScoreKind::Unscored);
    }

    #[test]
    fn round_to_two_decimals() {
        assert_eq!(round_to(32.004_9, 2), 32.0);
        assert_eq!(round_to(17.125_1, 2), 17.13);
    }
}
