//! Query types for [`crate::ProductStore::list`].

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use dropscout_core::{Category, ProductRecord};

pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Conjunction of optional predicates; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub min_score: Option<f64>,
    pub max_price: Option<f64>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    /// Matches records carrying any of these tags.
    pub tags: Vec<String>,
    pub store: Option<String>,
}

impl ProductFilter {
    #[must_use]
    pub fn matches(&self, record: &ProductRecord) -> bool {
        if self.category.is_some_and(|c| c != record.category) {
            return false;
        }
        if self.min_score.is_some_and(|min| record.score < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| record.price > max) {
            return false;
        }
        if let Some(needle) = self.search.as_deref().map(str::to_lowercase) {
            let in_title = record.title.to_lowercase().contains(&needle);
            let in_description = record
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| record.tags.contains(t)) {
            return false;
        }
        if self
            .store
            .as_deref()
            .is_some_and(|store| !record.source_store.eq_ignore_ascii_case(store))
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Score,
    Price,
    Trend,
    Newest,
    Title,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" => Ok(Self::Score),
            "price" => Ok(Self::Price),
            "trend" => Ok(Self::Trend),
            "newest" | "created" => Ok(Self::Newest),
            "title" | "name" => Ok(Self::Title),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Sort key and direction. Defaults to highest score first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl ProductSort {
    #[must_use]
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Total order over records; ties fall back to id so output is stable.
    #[must_use]
    pub fn compare(&self, a: &ProductRecord, b: &ProductRecord) -> Ordering {
        let primary = match self.field {
            SortField::Score => a.score.total_cmp(&b.score),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Trend => trend_score(a).total_cmp(&trend_score(b)),
            SortField::Newest => a.created_at.cmp(&b.created_at),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        let primary = match self.order {
            SortOrder::Ascending => primary,
            SortOrder::Descending => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

fn trend_score(record: &ProductRecord) -> f64 {
    record.trend_data.as_ref().map_or(0.0, |t| t.trend_score)
}

/// Offset/limit window over the sorted matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub items: Vec<ProductRecord>,
    /// Matches before paging.
    pub total: usize,
}

/// Aggregate figures over the whole store.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StoreStats {
    pub total_products: usize,
    /// Records scoring 80 or above.
    pub high_score_products: usize,
    /// Rounded to one decimal.
    pub average_score: f64,
    /// Rounded to two decimals.
    pub average_price: f64,
    pub total_facebook_ads: usize,
    pub total_tiktok_mentions: usize,
}
