use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Marketplaces with a search-page extractor profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchPlatform {
    Aliexpress,
    Temu,
    Amazon,
}

impl SearchPlatform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchPlatform::Aliexpress => "aliexpress",
            SearchPlatform::Temu => "temu",
            SearchPlatform::Amazon => "amazon",
        }
    }
}

impl std::fmt::Display for SearchPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of `config/sources.yaml`: which sources a crawl session runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesFile {
    /// Marketplaces crawled through their search pages.
    #[serde(default)]
    pub search_platforms: Vec<SearchPlatform>,
    /// Storefront base URLs crawled through their structured product feed.
    #[serde(default)]
    pub feed_stores: Vec<String>,
}

impl SourcesFile {
    /// Number of sources a session will run: one per search platform plus a
    /// single feed source covering all stores.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.search_platforms.len() + usize::from(!self.feed_stores.is_empty())
    }
}

/// Load and validate the sources configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_sources(&content)
}

/// Parse and validate sources YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_sources(content: &str) -> Result<SourcesFile, ConfigError> {
    let sources: SourcesFile =
        serde_yaml::from_str(content).map_err(ConfigError::SourcesFileParse)?;
    validate_sources(&sources)?;
    Ok(sources)
}

fn validate_sources(sources: &SourcesFile) -> Result<(), ConfigError> {
    if sources.search_platforms.is_empty() && sources.feed_stores.is_empty() {
        return Err(ConfigError::Validation(
            "at least one search platform or feed store must be configured".to_string(),
        ));
    }

    let mut seen_platforms = HashSet::new();
    for platform in &sources.search_platforms {
        if !seen_platforms.insert(*platform) {
            return Err(ConfigError::Validation(format!(
                "duplicate search platform: '{platform}'"
            )));
        }
    }

    let mut seen_stores = HashSet::new();
    for store in &sources.feed_stores {
        let trimmed = store.trim();
        if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "feed store '{store}' must be an http(s) URL"
            )));
        }
        let key = trimmed.trim_end_matches('/').to_lowercase();
        if !seen_stores.insert(key) {
            return Err(ConfigError::Validation(format!(
                "duplicate feed store: '{store}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
