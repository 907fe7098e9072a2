//! Inline score estimates attached by extractors before the full scoring
//! pass. Both take the random jitter as an argument so callers own the RNG.

use dropscout_core::{clamp_score, round_to};

pub const FEED_JITTER: f64 = 5.0;
pub const SEARCH_JITTER: f64 = 3.0;

const SEARCH_KEYWORDS: &[&str] = &[
    "smart",
    "wireless",
    "bluetooth",
    "led",
    "portable",
    "rechargeable",
];

/// Estimate for a storefront feed product from price and listing richness.
#[must_use]
pub fn feed_score(price: f64, images: usize, tags: usize, variants: usize, jitter: f64) -> f64 {
    let price_tier = if (10.0..=100.0).contains(&price) {
        20.0
    } else if price > 100.0 && price <= 200.0 {
        15.0
    } else if price < 10.0 {
        10.0
    } else {
        5.0
    };

    let images = count_bonus(images.saturating_mul(2));
    let tags = count_bonus(tags);
    let variants = count_bonus(variants.saturating_mul(3));

    finish(50.0 + price_tier + images + tags + variants + jitter)
}

/// Estimate for a search-page listing from price, title length and keywords.
#[must_use]
pub fn search_score(price: f64, title: &str, jitter: f64) -> f64 {
    let price_tier = if (5.0..=50.0).contains(&price) {
        25.0
    } else if price > 50.0 && price <= 100.0 {
        20.0
    } else if price < 5.0 {
        15.0
    } else {
        10.0
    };

    let words = count_bonus(title.split_whitespace().count());
    let lower = title.to_lowercase();
    let keyword_hits = SEARCH_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count();
    #[allow(clippy::cast_precision_loss)]
    let keywords = 2.0 * keyword_hits as f64;

    finish(50.0 + price_tier + words + keywords + jitter)
}

/// `min(n, 10)` as a score contribution.
#[allow(clippy::cast_precision_loss)]
fn count_bonus(n: usize) -> f64 {
    n.min(10) as f64
}

fn finish(raw: f64) -> f64 {
    clamp_score(round_to(raw, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_score_mid_price_rich_listing() {
        // 50 + 20 + min(8,10) + min(4,10) + min(9,10)
        assert!((feed_score(25.0, 4, 4, 3, 0.0) - 91.0).abs() < 1e-9);
    }

    #[test]
    fn feed_score_caps_each_bonus_and_clamps_total() {
        assert!((feed_score(50.0, 50, 50, 50, 5.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn feed_score_price_tiers() {
        assert!((feed_score(5.0, 0, 0, 0, 0.0) - 60.0).abs() < 1e-9);
        assert!((feed_score(150.0, 0, 0, 0, 0.0) - 65.0).abs() < 1e-9);
        assert!((feed_score(500.0, 0, 0, 0, 0.0) - 55.0).abs() < 1e-9);
    }

    #[test]
    fn feed_score_rounds_to_one_decimal() {
        let score = feed_score(500.0, 0, 0, 0, -1.234);
        assert!((score - 53.8).abs() < 1e-9);
    }

    #[test]
    fn search_score_counts_words_and_keywords() {
        // 50 + 25 + 4 words + 2*(smart, led)
        assert!((search_score(20.0, "Smart LED Desk Lamp", 0.0) - 83.0).abs() < 1e-9);
    }

    #[test]
    fn search_score_price_tiers() {
        assert!((search_score(2.0, "x", 0.0) - 66.0).abs() < 1e-9);
        assert!((search_score(75.0, "x", 0.0) - 71.0).abs() < 1e-9);
        assert!((search_score(300.0, "x", 0.0) - 61.0).abs() < 1e-9);
    }
}
