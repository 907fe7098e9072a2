//! `crawl` command handler.
//!
//! Loads the sources file and the product snapshot, runs one crawl session,
//! and writes the result back to the snapshot.

use std::sync::Arc;
use std::time::Duration;

use dropscout_core::{AppConfig, ProductRecord};
use dropscout_crawler::{CrawlOrchestrator, CrawlProgress, CrawlerSettings};
use dropscout_store::MemoryProductStore;

const WATCH_INTERVAL: Duration = Duration::from_secs(2);
const SUMMARY_TOP: usize = 5;

/// Run a crawl session, optionally watching its progress.
///
/// # Errors
///
/// Returns an error if the sources file or snapshot cannot be loaded, the
/// session cannot start, or the snapshot cannot be written.
pub(crate) async fn run_crawl(
    config: &AppConfig,
    max_per_source: usize,
    watch: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let sources = dropscout_core::load_sources(&config.sources_path)?;

    if dry_run {
        let platforms: Vec<&str> = sources.search_platforms.iter().map(|p| p.as_str()).collect();
        println!(
            "dry-run: would crawl {} sources (search: [{}], feed stores: {})",
            sources.source_count(),
            platforms.join(", "),
            sources.feed_stores.len()
        );
        return Ok(());
    }

    let store = Arc::new(MemoryProductStore::load_or_empty(&config.store_path)?);
    let orchestrator = Arc::new(CrawlOrchestrator::from_sources_file(
        CrawlerSettings::from_app_config(config),
        &sources,
        Arc::clone(&store) as Arc<dyn dropscout_store::ProductStore>,
    ));

    let records = if watch {
        let background = Arc::clone(&orchestrator);
        let handle =
            tokio::spawn(async move { background.run_full_crawl(max_per_source).await });
        let mut ticker = tokio::time::interval(WATCH_INTERVAL);
        while !handle.is_finished() {
            ticker.tick().await;
            print_progress(&orchestrator.get_progress());
        }
        handle.await??
    } else {
        orchestrator.run_full_crawl(max_per_source).await?
    };

    let saved = store.save_snapshot(&config.store_path)?;
    tracing::info!(path = %config.store_path.display(), saved, "product snapshot written");
    print_progress(&orchestrator.get_progress());
    print_summary(&records);
    println!("saved {saved} products to {}", config.store_path.display());
    Ok(())
}

fn print_progress(progress: &CrawlProgress) {
    println!(
        "[{:?}] {}/{} sources ({:.0}%), {} products",
        progress.status,
        progress.completed_sources,
        progress.total_sources,
        progress.percentage(),
        progress.total_products
    );
    for report in &progress.sources {
        let outcome = format!("{:?}", report.outcome);
        let detail = report.error.as_deref().unwrap_or("");
        println!(
            "  {:<18}{outcome:<11}{:>5}  {detail}",
            report.name, report.yielded
        );
    }
}

fn print_summary(records: &[ProductRecord]) {
    let synthetic = records.iter().filter(|r| r.is_synthetic()).count();
    println!(
        "crawl complete: {} products ({} extracted, {synthetic} synthetic)",
        records.len(),
        records.len() - synthetic
    );

    let mut ranked: Vec<&ProductRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    for record in ranked.into_iter().take(SUMMARY_TOP) {
        println!(
            "  {:>5.1}  ${:>8.2}  {}",
            record.score, record.price, record.title
        );
    }
}
