use std::path::Path;

use super::*;

#[test]
fn parses_platforms_and_stores() {
    let yaml = r"
search_platforms:
  - aliexpress
  - amazon
feed_stores:
  - https://www.gymshark.com
  - https://www.allbirds.com/
";
    let sources = parse_sources(yaml).unwrap();
    assert_eq!(
        sources.search_platforms,
        vec![SearchPlatform::Aliexpress, SearchPlatform::Amazon]
    );
    assert_eq!(sources.feed_stores.len(), 2);
    assert_eq!(sources.source_count(), 3);
}

#[test]
fn feed_stores_only_counts_one_source() {
    let yaml = "feed_stores: [\"https://a.example.com\", \"https://b.example.com\"]";
    let sources = parse_sources(yaml).unwrap();
    assert_eq!(sources.source_count(), 1);
}

#[test]
fn rejects_empty_configuration() {
    let err = parse_sources("search_platforms: []\n").unwrap_err();
    assert!(err.to_string().contains("at least one"));
}

#[test]
fn rejects_unknown_platform() {
    let err = parse_sources("search_platforms: [ebay]\n").unwrap_err();
    assert!(matches!(err, ConfigError::SourcesFileParse(_)));
}

#[test]
fn rejects_duplicate_platform() {
    let err = parse_sources("search_platforms: [temu, temu]\n").unwrap_err();
    assert!(err.to_string().contains("duplicate search platform"));
}

#[test]
fn rejects_non_http_store() {
    let err = parse_sources("feed_stores: [\"gymshark.com\"]\n").unwrap_err();
    assert!(err.to_string().contains("http(s) URL"));
}

#[test]
fn rejects_duplicate_store_ignoring_trailing_slash_and_case() {
    let yaml = "feed_stores: [\"https://Shop.example.com/\", \"https://shop.example.com\"]";
    let err = parse_sources(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate feed store"));
}

#[test]
fn load_sources_reports_missing_file() {
    let err = load_sources(Path::new("/nonexistent/sources.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::SourcesFileIo { .. }));
}

#[test]
fn load_sources_reads_repo_config() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/sources.yaml");
    let sources = load_sources(&path).unwrap();
    assert!(sources.source_count() >= 1);
}
