use std::collections::BTreeMap;

use dropscout_core::{Category, SupplierPlatform};

use super::*;

fn record(price: f64) -> ProductRecord {
    ProductRecord::new("test_1", "Test Product", price, Category::Gadgets, "example.com")
}

fn ad(reach: u64, likes: u64, comments: u64, shares: u64) -> AdMetric {
    AdMetric {
        id: "ad_1".into(),
        text: String::new(),
        engagement_rate: 0.0,
        reach,
        impressions: 0,
        clicks: 0,
        spend: None,
        likes,
        comments,
        shares,
    }
}

fn video(views: u64, likes: u64, shares: u64, comments: u64) -> VideoMetric {
    VideoMetric {
        id: "video_1".into(),
        url: String::new(),
        description: String::new(),
        views,
        likes,
        shares,
        comments,
        hashtags: Vec::new(),
    }
}

fn trend(score: f64) -> TrendSignal {
    TrendSignal {
        keyword: "test".into(),
        trend_score: score,
        interest_over_time: Vec::new(),
        related_queries: Vec::new(),
        geographic_interest: BTreeMap::new(),
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ---------------------------------------------------------------------------
// weights
// ---------------------------------------------------------------------------

#[test]
fn default_weights_sum_to_one() {
    let sum: f64 = ScoreWeights::default().named().iter().map(|(_, w)| w).sum();
    assert!(approx(sum, 1.0), "sum was {sum}");
}

#[test]
fn weights_rejects_bad_sum() {
    let err = ScoreWeights::new(0.3, 0.3, 0.3, 0.3, 0.3).unwrap_err();
    assert!(err.to_string().contains("sum to 1.0"), "got: {err}");
}

#[test]
fn weights_rejects_negative() {
    let err = ScoreWeights::new(1.2, -0.2, 0.0, 0.0, 0.0).unwrap_err();
    assert!(err.to_string().contains("tiktok_viral_ratio"), "got: {err}");
}

#[test]
fn weights_rejects_nan() {
    assert!(ScoreWeights::new(f64::NAN, 0.25, 0.2, 0.1, 0.15).is_err());
}

#[test]
fn weights_accepts_custom_table() {
    let weights = ScoreWeights::new(0.2, 0.2, 0.2, 0.2, 0.2).unwrap();
    assert!(approx(weights.trend_volume(), 0.2));
}

// ---------------------------------------------------------------------------
// dimensions
// ---------------------------------------------------------------------------

#[test]
fn profit_margin_sixty_percent_scores_ninety() {
    let mut r = record(30.0);
    r.supplier_prices.insert(SupplierPlatform::AliExpress, 12.0);
    let scores = ScoringEngine::dimension_scores(&r);
    assert!(approx(scores.profit_margin, 90.0));
    assert!(approx(
        ScoreWeights::default().profit_margin() * scores.profit_margin,
        18.0
    ));
}

#[test]
fn profit_margin_uses_cheapest_supplier() {
    let mut r = record(20.0);
    r.supplier_prices.insert(SupplierPlatform::AliExpress, 16.0);
    r.supplier_prices.insert(SupplierPlatform::Temu, 15.0);
    // margin 25% → 50
    assert!(approx(ScoringEngine::dimension_scores(&r).profit_margin, 50.0));
}

#[test]
fn profit_margin_defaults_and_edges() {
    let mut r = record(10.0);
    assert!(approx(ScoringEngine::dimension_scores(&r).profit_margin, 50.0));

    r.supplier_prices.insert(SupplierPlatform::Shop1688, 0.0);
    assert!(approx(ScoringEngine::dimension_scores(&r).profit_margin, 50.0));

    r.supplier_prices.insert(SupplierPlatform::Shop1688, 15.0);
    assert!(approx(ScoringEngine::dimension_scores(&r).profit_margin, 0.0));

    let mut free = record(0.0);
    free.supplier_prices.insert(SupplierPlatform::Temu, 3.0);
    assert!(approx(ScoringEngine::dimension_scores(&free).profit_margin, 0.0));
}

#[test]
fn facebook_engagement_scales_and_caps() {
    let mut r = record(10.0);
    // 200 / 10_000 = 0.02 → 40
    r.facebook_ads.push(ad(10_000, 150, 30, 20));
    assert!(approx(
        ScoringEngine::dimension_scores(&r).facebook_engagement,
        40.0
    ));

    r.facebook_ads.push(ad(100, 100, 0, 0));
    assert!(approx(
        ScoringEngine::dimension_scores(&r).facebook_engagement,
        100.0
    ));
}

#[test]
fn facebook_engagement_zero_reach_does_not_divide_by_zero() {
    let mut r = record(10.0);
    r.facebook_ads.push(ad(0, 0, 0, 0));
    assert!(approx(
        ScoringEngine::dimension_scores(&r).facebook_engagement,
        0.0
    ));
}

#[test]
fn tiktok_zero_view_videos_count_as_zero() {
    let mut r = record(10.0);
    // 50 / 1000 * 1000 = 50, averaged with a zero-view video → 25
    r.tiktok_mentions.push(video(1000, 30, 10, 10));
    r.tiktok_mentions.push(video(0, 500, 0, 0));
    assert!(approx(
        ScoringEngine::dimension_scores(&r).tiktok_viral_ratio,
        25.0
    ));
}

#[test]
fn trend_is_clamped_and_non_finite_falls_back() {
    let mut r = record(10.0);
    r.trend_data = Some(trend(140.0));
    assert!(approx(ScoringEngine::dimension_scores(&r).trend_volume, 100.0));
    r.trend_data = Some(trend(f64::NAN));
    assert!(approx(ScoringEngine::dimension_scores(&r).trend_volume, 50.0));
}

#[test]
fn saturation_steps() {
    assert!(approx(store_saturation(0), 100.0));
    assert!(approx(store_saturation(5), 100.0));
    assert!(approx(store_saturation(6), 80.0));
    assert!(approx(store_saturation(20), 80.0));
    assert!(approx(store_saturation(50), 60.0));
    assert!(approx(store_saturation(100), 40.0));
    assert!(approx(store_saturation(101), 20.0));
}

// ---------------------------------------------------------------------------
// totals
// ---------------------------------------------------------------------------

#[test]
fn sparse_record_with_trend_scores_thirty_two() {
    let mut r = record(25.0);
    r.trend_data = Some(trend(70.0));
    assert!(approx(ScoringEngine::default().score(&r), 32.0));
}

#[test]
fn empty_record_stays_in_range() {
    let score = ScoringEngine::default().score(&record(0.0));
    // 0.2*50 + 0.1*50 + 0.15*100
    assert!(approx(score, 30.0));
}

#[test]
fn scoring_is_idempotent() {
    let engine = ScoringEngine::default();
    let mut r = record(42.0);
    r.facebook_ads.push(ad(5000, 90, 12, 7));
    r.tiktok_mentions.push(video(20_000, 900, 40, 60));
    r.supplier_prices.insert(SupplierPlatform::Temu, 19.0);
    r.similar_stores = vec!["a.com".into(); 12];
    assert_eq!(engine.score(&r), engine.score(&r));
    let score = engine.score(&r);
    assert!((0.0..=100.0).contains(&score));
}

#[test]
fn apply_assigns_engine_score() {
    let mut r = record(25.0);
    let score = ScoringEngine::default().apply(&mut r);
    assert!(r.is_engine_scored());
    assert!(approx(r.score, score));
}

// ---------------------------------------------------------------------------
// breakdown
// ---------------------------------------------------------------------------

#[test]
fn breakdown_lists_triggered_recommendations() {
    let mut r = record(10.0);
    r.supplier_prices.insert(SupplierPlatform::AliExpress, 9.0);
    r.trend_data = Some(trend(10.0));
    r.similar_stores = vec!["x.com".into(); 150];

    let breakdown = ScoringEngine::default().breakdown(&r);

    assert_eq!(breakdown.recommendations.len(), 5);
    assert!(breakdown.recommendations[0].contains("ad creative"));
    assert!(breakdown.recommendations[2].contains("supplier pricing"));
    assert!(breakdown.recommendations[4].contains("niche differentiation"));
    assert!(approx(breakdown.total_score, ScoringEngine::default().score(&r)));
}

#[test]
fn breakdown_omits_recommendations_for_strong_record() {
    let mut r = record(30.0);
    r.facebook_ads.push(ad(1000, 40, 5, 5));
    r.tiktok_mentions.push(video(1000, 80, 10, 10));
    r.supplier_prices.insert(SupplierPlatform::AliExpress, 12.0);
    r.trend_data = Some(trend(80.0));

    let breakdown = ScoringEngine::default().breakdown(&r);
    assert!(breakdown.recommendations.is_empty(), "{:?}", breakdown.recommendations);
}

#[test]
fn breakdown_serializes_weight_table() {
    let breakdown = ScoringEngine::default().breakdown(&record(10.0));
    let json = serde_json::to_value(&breakdown).unwrap();
    assert_eq!(json["weights"]["facebook_engagement"], 0.3);
    assert_eq!(json["breakdown"]["store_saturation"], 100.0);
}
