use chrono::{Duration, Utc};
use dropscout_core::{AdMetric, TrendSignal};

use super::*;
use crate::query::{SortField, SortOrder};

fn record(id: &str, title: &str, price: f64, score: f64, category: Category) -> ProductRecord {
    let mut r = ProductRecord::new(id, title, price, category, "example.com");
    r.assign_score(score);
    r
}

fn seeded() -> MemoryProductStore {
    let mut speaker = record("p1", "LED Flame Speaker", 29.99, 82.5, Category::Gadgets);
    speaker.tags = ["bluetooth", "gift"].iter().map(|t| (*t).to_owned()).collect();
    speaker.facebook_ads.push(AdMetric::default());
    speaker.trend_data = Some(TrendSignal {
        trend_score: 75.0,
        ..TrendSignal::default()
    });

    let mut bottle = record("p2", "Smart Water Bottle", 49.99, 78.2, Category::Fitness);
    bottle.description = Some("Hydration tracking with app".into());
    bottle.tags = ["fitness", "smart"].iter().map(|t| (*t).to_owned()).collect();
    bottle.source_store = "fitness-store.com".into();
    bottle.created_at = Utc::now() - Duration::days(3);

    let mut vacuum = record("p3", "Car Vacuum Cleaner", 39.99, 85.1, Category::Automotive);
    vacuum.tags = ["car", "gift"].iter().map(|t| (*t).to_owned()).collect();
    vacuum.trend_data = Some(TrendSignal {
        trend_score: 82.0,
        ..TrendSignal::default()
    });

    let store = MemoryProductStore::new();
    store.replace_all(vec![speaker, bottle, vacuum]);
    store
}

fn ids(page: &ProductPage) -> Vec<&str> {
    page.items.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn replace_all_swaps_entire_set() {
    let store = seeded();
    assert_eq!(store.len(), 3);

    let count = store.replace_all(vec![record("n1", "New One", 5.0, 10.0, Category::Home)]);
    assert_eq!(count, 1);
    assert!(store.get("p1").is_none());
    assert!(store.get("n1").is_some());
}

#[test]
fn replace_all_keeps_last_duplicate() {
    let store = MemoryProductStore::new();
    let count = store.replace_all(vec![
        record("dup", "First", 1.0, 10.0, Category::Home),
        record("dup", "Second", 2.0, 20.0, Category::Home),
    ]);
    assert_eq!(count, 1);
    assert_eq!(store.get("dup").unwrap().title, "Second");
}

#[test]
fn list_defaults_to_score_descending() {
    let page = seeded().list(&ProductFilter::default(), ProductSort::default(), Page::default());
    assert_eq!(page.total, 3);
    assert_eq!(ids(&page), vec!["p3", "p1", "p2"]);
}

#[test]
fn list_filters_by_category_and_price() {
    let store = seeded();
    let filter = ProductFilter {
        max_price: Some(40.0),
        ..ProductFilter::default()
    };
    let page = store.list(&filter, ProductSort::default(), Page::default());
    assert_eq!(ids(&page), vec!["p3", "p1"]);

    let filter = ProductFilter {
        category: Some(Category::Fitness),
        ..ProductFilter::default()
    };
    assert_eq!(
        ids(&store.list(&filter, ProductSort::default(), Page::default())),
        vec!["p2"]
    );
}

#[test]
fn list_search_matches_title_or_description_case_insensitively() {
    let store = seeded();
    let by_description = ProductFilter {
        search: Some("HYDRATION".into()),
        ..ProductFilter::default()
    };
    assert_eq!(
        ids(&store.list(&by_description, ProductSort::default(), Page::default())),
        vec!["p2"]
    );

    let by_title = ProductFilter {
        search: Some("vacuum".into()),
        ..ProductFilter::default()
    };
    assert_eq!(
        ids(&store.list(&by_title, ProductSort::default(), Page::default())),
        vec!["p3"]
    );
}

#[test]
fn list_tags_match_any() {
    let filter = ProductFilter {
        tags: vec!["gift".into(), "nonexistent".into()],
        ..ProductFilter::default()
    };
    let page = seeded().list(&filter, ProductSort::default(), Page::default());
    assert_eq!(ids(&page), vec!["p3", "p1"]);
}

#[test]
fn list_filters_by_store_and_min_score() {
    let store = seeded();
    let filter = ProductFilter {
        store: Some("Fitness-Store.com".into()),
        ..ProductFilter::default()
    };
    assert_eq!(
        ids(&store.list(&filter, ProductSort::default(), Page::default())),
        vec!["p2"]
    );

    let filter = ProductFilter {
        min_score: Some(80.0),
        ..ProductFilter::default()
    };
    assert_eq!(store.list(&filter, ProductSort::default(), Page::default()).total, 2);
}

#[test]
fn list_sorts_by_each_field() {
    let store = seeded();
    let all = ProductFilter::default();

    let by_price = ProductSort::new(SortField::Price, SortOrder::Ascending);
    assert_eq!(ids(&store.list(&all, by_price, Page::default())), vec!["p1", "p3", "p2"]);

    // Records without trend data sort as 0.
    let by_trend = ProductSort::new(SortField::Trend, SortOrder::Descending);
    assert_eq!(ids(&store.list(&all, by_trend, Page::default())), vec!["p3", "p1", "p2"]);

    let by_title = ProductSort::new(SortField::Title, SortOrder::Ascending);
    assert_eq!(ids(&store.list(&all, by_title, Page::default())), vec!["p3", "p1", "p2"]);

    let oldest_first = ProductSort::new(SortField::Newest, SortOrder::Ascending);
    assert_eq!(ids(&store.list(&all, oldest_first, Page::default()))[0], "p2");
}

#[test]
fn list_pages_after_sorting() {
    let page = seeded().list(
        &ProductFilter::default(),
        ProductSort::default(),
        Page {
            offset: 1,
            limit: 1,
        },
    );
    assert_eq!(page.total, 3);
    assert_eq!(ids(&page), vec!["p1"]);
}

#[test]
fn aggregate_counts() {
    let store = seeded();
    let categories = store.category_counts();
    assert_eq!(categories.get(&Category::Gadgets), Some(&1));
    assert_eq!(categories.len(), 3);

    let tags = store.tag_counts();
    assert_eq!(tags.get("gift"), Some(&2));
    assert_eq!(tags.get("smart"), Some(&1));
}

#[test]
fn stats_summarize_store() {
    let stats = seeded().stats();
    assert_eq!(stats.total_products, 3);
    assert_eq!(stats.high_score_products, 2);
    // (82.5 + 78.2 + 85.1) / 3 = 81.93
    assert!((stats.average_score - 81.9).abs() < 1e-9);
    // (29.99 + 49.99 + 39.99) / 3 = 39.99
    assert!((stats.average_price - 39.99).abs() < 1e-9);
    assert_eq!(stats.total_facebook_ads, 1);
    assert_eq!(stats.total_tiktok_mentions, 0);
}

#[test]
fn stats_of_empty_store_are_zero() {
    assert_eq!(MemoryProductStore::new().stats(), StoreStats::default());
}

#[test]
fn sort_field_parses_aliases() {
    assert_eq!("name".parse::<SortField>(), Ok(SortField::Title));
    assert_eq!("NEWEST".parse::<SortField>(), Ok(SortField::Newest));
    assert!("rating".parse::<SortField>().is_err());
    assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Ascending));
}
