//! In-memory [`ProductStore`] with an optional JSON snapshot file.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dropscout_core::{round_to, Category, ProductRecord};

use crate::error::StoreError;
use crate::query::{Page, ProductFilter, ProductPage, ProductSort, StoreStats};
use crate::ProductStore;

const HIGH_SCORE_THRESHOLD: f64 = 80.0;

#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: RwLock<HashMap<String, ProductRecord>>,
}

impl MemoryProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Writes every record to `path` as a JSON array sorted by id.
    ///
    /// The file is written next to `path` under a temporary name and renamed
    /// into place. Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on filesystem failure or
    /// [`StoreError::Json`] if serialization fails.
    pub fn save_snapshot(&self, path: &Path) -> Result<usize, StoreError> {
        let mut records: Vec<ProductRecord> = self.read().values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));

        let json = serde_json::to_vec_pretty(&records).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        std::fs::write(&tmp, json).map_err(io_err)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(e));
        }

        tracing::debug!(path = %path.display(), count = records.len(), "saved product snapshot");
        Ok(records.len())
    }

    /// Loads a store from a snapshot written by [`Self::save_snapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read (including when
    /// it does not exist) or [`StoreError::Json`] if it is malformed.
    pub fn load_snapshot(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<ProductRecord> =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let store = Self::new();
        let count = store.replace_all(records);
        tracing::debug!(path = %path.display(), count, "loaded product snapshot");
        Ok(store)
    }

    /// As [`Self::load_snapshot`], but a missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Any error other than the file not existing.
    pub fn load_or_empty(path: &Path) -> Result<Self, StoreError> {
        match Self::load_snapshot(path) {
            Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok(Self::new())
            }
            other => other,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ProductRecord>> {
        self.products.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ProductRecord>> {
        self.products.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProductStore for MemoryProductStore {
    fn replace_all(&self, records: Vec<ProductRecord>) -> usize {
        let incoming = records.len();
        let replacement: HashMap<String, ProductRecord> =
            records.into_iter().map(|r| (r.id.clone(), r)).collect();
        let count = replacement.len();
        if count < incoming {
            tracing::warn!(
                incoming,
                stored = count,
                "duplicate ids in replacement set, later records kept"
            );
        }
        *self.write() = replacement;
        count
    }

    fn get(&self, id: &str) -> Option<ProductRecord> {
        self.read().get(id).cloned()
    }

    fn list(&self, filter: &ProductFilter, sort: ProductSort, page: Page) -> ProductPage {
        let mut matches: Vec<ProductRecord> = self
            .read()
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matches.sort_by(|a, b| sort.compare(a, b));

        let total = matches.len();
        let items = matches
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();
        ProductPage { items, total }
    }

    fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for record in self.read().values() {
            *counts.entry(record.category).or_insert(0) += 1;
        }
        counts
    }

    fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.read().values().flat_map(|r| r.tags.iter()) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn stats(&self) -> StoreStats {
        let products = self.read();
        if products.is_empty() {
            return StoreStats::default();
        }

        #[allow(clippy::cast_precision_loss)]
        let n = products.len() as f64;
        let score_sum: f64 = products.values().map(|r| r.score).sum();
        let price_sum: f64 = products.values().map(|r| r.price).sum();

        StoreStats {
            total_products: products.len(),
            high_score_products: products
                .values()
                .filter(|r| r.score >= HIGH_SCORE_THRESHOLD)
                .count(),
            average_score: round_to(score_sum / n, 1),
            average_price: round_to(price_sum / n, 2),
            total_facebook_ads: products.values().map(|r| r.facebook_ads.len()).sum(),
            total_tiktok_mentions: products.values().map(|r| r.tiktok_mentions.len()).sum(),
        }
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
