//! Text helpers shared by the extractors: price parsing, HTML stripping,
//! tag extraction, and keyword-based category inference.

use std::sync::LazyLock;

use dropscout_core::Category;
use regex::Regex;

/// Prices outside this range are treated as unparseable.
pub const MIN_PRICE: f64 = 0.01;
pub const MAX_PRICE: f64 = 10_000.0;

pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MAX_TITLE_TAGS: usize = 8;

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d,]+\.?\d*").expect("valid price regex"));

const TAG_STOP_WORDS: &[&str] = &[
    "new", "best", "top", "trending", "popular", "hot", "sale", "deal", "discount", "the", "and",
    "or", "for", "with", "in", "on", "at", "to", "of", "a", "an",
];

/// Keyword table applied to listing titles; first matching category wins.
const TITLE_CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Gadgets,
        &["gadget", "tech", "electronic", "smart", "wireless", "bluetooth", "led", "usb", "charger", "cable"],
    ),
    (
        Category::Fitness,
        &["fitness", "workout", "exercise", "gym", "sport", "athletic", "health", "yoga", "training"],
    ),
    (
        Category::Home,
        &["home", "kitchen", "bedroom", "living", "furniture", "decor", "household", "cleaning", "organizer"],
    ),
    (
        Category::Fashion,
        &["fashion", "clothing", "apparel", "style", "wear", "outfit", "dress", "shirt", "pants", "accessory"],
    ),
    (
        Category::Beauty,
        &["beauty", "cosmetic", "skincare", "makeup", "personal care", "grooming", "hair", "skin"],
    ),
    (Category::Pets, &["pet", "dog", "cat", "animal", "toy", "food"]),
    (Category::Kids, &["kids", "children", "baby", "toy", "educational", "child", "learning"]),
    (
        Category::Automotive,
        &["car", "auto", "automotive", "vehicle", "automobile", "driving", "accessory"],
    ),
    (
        Category::Garden,
        &["garden", "outdoor", "plant", "gardening", "lawn", "yard", "flower", "seed"],
    ),
    (Category::Sports, &["sport", "outdoor", "recreation", "athletic", "fitness", "game", "ball"]),
];

/// Keyword table applied to storefront tags, then to the product type.
const STOREFRONT_CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Gadgets, &["gadget", "tech", "electronic", "smart"]),
    (Category::Home, &["home", "kitchen", "household"]),
    (Category::Fashion, &["fashion", "clothing", "wear", "style"]),
    (Category::Beauty, &["beauty", "skincare", "makeup", "cosmetic"]),
    (Category::Fitness, &["fitness", "workout", "exercise", "sport"]),
    (Category::Pets, &["pet", "dog", "cat", "animal"]),
    (Category::Kids, &["kid", "child", "baby", "toy"]),
    (Category::Automotive, &["car", "auto", "vehicle", "automotive"]),
    (Category::Garden, &["garden", "plant", "outdoor", "lawn"]),
    (Category::Sports, &["sport", "athletic", "game"]),
];

/// Extracts a price from free-form text such as `"US $1,299.99"`.
///
/// Returns `None` when no number is found or it falls outside
/// [`MIN_PRICE`]..=[`MAX_PRICE`].
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    let matched = PRICE_RE.find(&cleaned)?;
    let price = matched.as_str().parse::<f64>().ok()?;
    (MIN_PRICE..=MAX_PRICE).contains(&price).then_some(price)
}

/// Parses a plain decimal string like `"30.00"`; non-finite and negative
/// values are rejected.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Removes markup tags and collapses whitespace.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to `max_chars` characters, appending `...` when shortened.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_owned(),
    }
}

/// Derives lower-case tags from a listing title.
///
/// Words are stripped of punctuation; words of four or more characters that
/// are not stop words are kept, in order, up to [`MAX_TITLE_TAGS`].
#[must_use]
pub fn tags_from_title(title: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for word in title.to_lowercase().split_whitespace() {
        let clean: String = word
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if clean.chars().count() > 3 && !TAG_STOP_WORDS.contains(&clean.as_str()) && !tags.contains(&clean) {
            tags.push(clean);
        }
        if tags.len() == MAX_TITLE_TAGS {
            break;
        }
    }
    tags
}

/// Infers a category from a listing title; defaults to gadgets.
#[must_use]
pub fn category_from_title(title: &str) -> Category {
    let lower = title.to_lowercase();
    match_keywords(TITLE_CATEGORY_KEYWORDS, &lower).unwrap_or_default()
}

/// Infers a category from storefront tags first, then the product type;
/// defaults to gadgets.
#[must_use]
pub fn category_from_storefront(tags: &[String], product_type: Option<&str>) -> Category {
    tags.iter()
        .find_map(|tag| match_keywords(STOREFRONT_CATEGORY_KEYWORDS, &tag.to_lowercase()))
        .or_else(|| {
            product_type
                .and_then(|kind| match_keywords(STOREFRONT_CATEGORY_KEYWORDS, &kind.to_lowercase()))
        })
        .unwrap_or_default()
}

fn match_keywords(table: &[(Category, &[&str])], haystack: &str) -> Option<Category> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|(category, _)| *category)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
