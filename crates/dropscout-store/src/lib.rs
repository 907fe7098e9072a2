//! Product persistence behind the narrow [`ProductStore`] interface.
//!
//! The crawler only ever calls [`ProductStore::replace_all`]; the query side
//! (filter, sort, page, aggregates) serves the CLI.

pub mod error;
pub mod memory;
pub mod query;

use std::collections::BTreeMap;

use dropscout_core::{Category, ProductRecord};

pub use error::StoreError;
pub use memory::MemoryProductStore;
pub use query::{Page, ProductFilter, ProductPage, ProductSort, SortField, SortOrder, StoreStats};

/// Storage contract consumed by the crawl pipeline and the control surface.
pub trait ProductStore: Send + Sync {
    /// Replaces the stored set with `records`; returns the stored count.
    fn replace_all(&self, records: Vec<ProductRecord>) -> usize;

    fn get(&self, id: &str) -> Option<ProductRecord>;

    /// Filtered, sorted page plus the total number of matches.
    fn list(&self, filter: &ProductFilter, sort: ProductSort, page: Page) -> ProductPage;

    fn category_counts(&self) -> BTreeMap<Category, usize>;

    fn tag_counts(&self) -> BTreeMap<String, usize>;

    fn stats(&self) -> StoreStats;
}
