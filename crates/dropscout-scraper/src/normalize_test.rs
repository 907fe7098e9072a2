use dropscout_core::{Category, ScoreKind};

use super::*;
use crate::types::{FeedImage, FeedPrice, FeedVariant};

fn variant(price: &str) -> FeedVariant {
    FeedVariant {
        id: Some(1),
        title: Some("Default Title".to_owned()),
        price: Some(FeedPrice::Text(price.to_owned())),
        compare_at_price: None,
        available: true,
    }
}

fn image(src: &str) -> FeedImage {
    FeedImage {
        src: src.to_owned(),
        alt: None,
    }
}

fn product(variants: Vec<FeedVariant>) -> FeedProduct {
    FeedProduct {
        id: 123_456_789,
        title: "  Seamless Leggings  ".to_owned(),
        handle: "seamless-leggings".to_owned(),
        body_html: Some("<p>Squat-proof <b>fabric</b>.</p>".to_owned()),
        product_type: Some("Womens Clothing".to_owned()),
        tags: vec!["workout".to_owned(), "new".to_owned()],
        vendor: Some("Gymshark".to_owned()),
        images: vec![
            image("https://cdn.example.com/a.jpg"),
            image("https://cdn.example.com/b.jpg"),
        ],
        variants,
    }
}

#[test]
fn sets_prefixed_id_store_and_url() {
    let record =
        normalize_feed_product(product(vec![variant("40.00")]), "https://www.gymshark.com/", 0.0)
            .unwrap();
    assert_eq!(record.id, "shopify_123456789");
    assert_eq!(record.title, "Seamless Leggings");
    assert_eq!(record.source_store, "gymshark.com");
    assert_eq!(
        record.source_url.as_deref(),
        Some("https://www.gymshark.com/products/seamless-leggings")
    );
    assert_eq!(
        record.image_url.as_deref(),
        Some("https://cdn.example.com/a.jpg")
    );
}

#[test]
fn price_range_uses_min_and_max_variant() {
    let record = normalize_feed_product(
        product(vec![variant("55.00"), variant("40.00"), variant("not a price")]),
        "https://gymshark.com",
        0.0,
    )
    .unwrap();
    assert!((record.price - 40.0).abs() < 1e-9);
    assert_eq!(record.compare_price, Some(55.0));
}

#[test]
fn single_price_compare_is_marked_up() {
    let record =
        normalize_feed_product(product(vec![variant("20.00")]), "https://gymshark.com", 0.0)
            .unwrap();
    assert_eq!(record.compare_price, Some(30.0));
}

#[test]
fn product_without_priced_variant_is_rejected() {
    let result = normalize_feed_product(product(vec![]), "https://gymshark.com", 0.0);
    assert!(matches!(result, Err(ScraperError::Parse { .. })));
}

#[test]
fn description_is_stripped_and_truncated() {
    let mut raw = product(vec![variant("10.00")]);
    raw.body_html = Some(format!("<div>{}</div>", "x".repeat(600)));
    let record = normalize_feed_product(raw, "https://gymshark.com", 0.0).unwrap();
    let description = record.description.unwrap();
    assert_eq!(description.chars().count(), MAX_DESCRIPTION_CHARS + 3);
    assert!(description.ends_with("..."));

    let record =
        normalize_feed_product(product(vec![variant("10.00")]), "https://gymshark.com", 0.0)
            .unwrap();
    assert_eq!(record.description.as_deref(), Some("Squat-proof fabric."));
}

#[test]
fn category_comes_from_tags_before_type() {
    let record =
        normalize_feed_product(product(vec![variant("10.00")]), "https://gymshark.com", 0.0)
            .unwrap();
    assert_eq!(record.category, Category::Fitness);
}

#[test]
fn tags_are_capped() {
    let mut raw = product(vec![variant("10.00")]);
    raw.tags = (0..15).map(|i| format!("tag{i:02}")).collect();
    let record = normalize_feed_product(raw, "https://gymshark.com", 0.0).unwrap();
    assert_eq!(record.tags.len(), MAX_FEED_TAGS);
    assert!(record.tags.contains("tag00"));
    assert!(!record.tags.contains("tag10"));
}

#[test]
fn placeholder_score_is_attached() {
    let record =
        normalize_feed_product(product(vec![variant("40.00")]), "https://gymshark.com", 0.0)
            .unwrap();
    // 50 + 20 (price tier) + 4 (images) + 2 (tags) + 3 (variants)
    assert!((record.score - 79.0).abs() < 1e-9);
    assert_eq!(record.score_kind, ScoreKind::Placeholder);
    assert!(!record.is_synthetic());
}
