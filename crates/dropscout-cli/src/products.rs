//! Read-only product queries against the stored snapshot.

use clap::Subcommand;

use dropscout_core::{AppConfig, Category};
use dropscout_scoring::ScoringEngine;
use dropscout_store::{
    MemoryProductStore, Page, ProductFilter, ProductSort, ProductStore, SortField, SortOrder,
};

const TOP_TAGS: usize = 10;

/// Sub-commands available under `products`.
#[derive(Debug, Subcommand)]
pub enum ProductCommands {
    /// List stored products, filtered and sorted
    List {
        #[arg(long)]
        category: Option<Category>,
        /// Minimum score (0-100)
        #[arg(long)]
        min_score: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// Case-insensitive text to find in title or description
        #[arg(long)]
        search: Option<String>,
        /// Match products carrying any of these tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Source store, e.g. temu.com
        #[arg(long)]
        store: Option<String>,
        /// score, price, trend, newest or title
        #[arg(long, default_value = "score")]
        sort: SortField,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
        #[arg(long, default_value = "0")]
        offset: usize,
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Print the page as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one product with its score breakdown
    Show {
        /// Product id
        id: String,
    },
    /// Show store-wide statistics, category and tag counts
    Stats,
}

/// # Errors
///
/// Returns an error if the snapshot cannot be read, the product is not
/// found, or JSON output fails.
pub(crate) fn run_products(config: &AppConfig, command: ProductCommands) -> anyhow::Result<()> {
    let store = MemoryProductStore::load_or_empty(&config.store_path)?;

    match command {
        ProductCommands::List {
            category,
            min_score,
            max_price,
            search,
            tags,
            store: source_store,
            sort,
            order,
            offset,
            limit,
            json,
        } => {
            let filter = ProductFilter {
                category,
                min_score,
                max_price,
                search,
                tags,
                store: source_store,
            };
            let page = store.list(
                &filter,
                ProductSort::new(sort, order),
                Page { offset, limit },
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }
            if page.items.is_empty() {
                println!("no products match");
                return Ok(());
            }
            println!(
                "{:<34}{:>7}{:>10}  {:<11}{:<16}{}",
                "id", "score", "price", "category", "store", "title"
            );
            for record in &page.items {
                println!(
                    "{:<34}{:>7.1}{:>10.2}  {:<11}{:<16}{}",
                    record.id,
                    record.score,
                    record.price,
                    record.category.as_str(),
                    record.source_store,
                    record.title
                );
            }
            println!(
                "showing {}-{} of {}",
                offset + 1,
                offset + page.items.len(),
                page.total
            );
        }
        ProductCommands::Show { id } => {
            let record = store
                .get(&id)
                .ok_or_else(|| anyhow::anyhow!("product '{id}' not found"))?;
            let breakdown = ScoringEngine::default().breakdown(&record);
            println!("{}", serde_json::to_string_pretty(&record)?);
            println!("{}", serde_json::to_string_pretty(&breakdown)?);
        }
        ProductCommands::Stats => {
            let stats = store.stats();
            println!("products:          {}", stats.total_products);
            println!("high score (>=80): {}", stats.high_score_products);
            println!("average score:     {:.1}", stats.average_score);
            println!("average price:     {:.2}", stats.average_price);
            println!("facebook ads:      {}", stats.total_facebook_ads);
            println!("tiktok mentions:   {}", stats.total_tiktok_mentions);

            println!();
            println!("categories:");
            for (category, count) in store.category_counts() {
                println!("  {:<12}{count}", category.as_str());
            }

            let mut tags: Vec<(String, usize)> = store.tag_counts().into_iter().collect();
            tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            println!();
            println!("top tags:");
            for (tag, count) in tags.into_iter().take(TOP_TAGS) {
                println!("  {tag:<20}{count}");
            }
        }
    }
    Ok(())
}
