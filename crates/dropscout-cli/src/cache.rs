//! Response cache maintenance commands.

use clap::Subcommand;

use dropscout_core::AppConfig;
use dropscout_scraper::{CacheBucket, ResponseCache};

/// Sub-commands available under `cache`.
#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Show entry counts, sizes and expired entries per bucket
    Stats,
    /// Delete cached entries
    Clear {
        /// Only clear this bucket (raw_page, feed, record)
        #[arg(long)]
        bucket: Option<CacheBucket>,
    },
    /// Delete expired entries
    Cleanup,
}

/// # Errors
///
/// Cache operations degrade silently, so this only fails on output errors.
pub(crate) async fn run_cache(config: &AppConfig, command: CacheCommands) -> anyhow::Result<()> {
    let cache = ResponseCache::new(
        &config.cache_dir,
        std::time::Duration::from_secs(config.cache_ttl_secs),
    );

    match command {
        CacheCommands::Stats => {
            let stats = cache.stats().await;
            println!("cache: {}", cache.root().display());
            println!("{:<10}{:>9}{:>13}{:>9}", "bucket", "entries", "bytes", "expired");
            for (bucket, s) in &stats {
                println!(
                    "{:<10}{:>9}{:>13}{:>9}",
                    bucket.as_str(),
                    s.entries,
                    s.size_bytes,
                    s.expired
                );
            }
        }
        CacheCommands::Clear { bucket } => {
            let removed = cache.clear(bucket).await;
            let scope = bucket.map_or("all buckets", CacheBucket::as_str);
            println!("removed {removed} entries from {scope}");
        }
        CacheCommands::Cleanup => {
            let removed = cache.cleanup_expired().await;
            println!("removed {removed} expired entries");
        }
    }
    Ok(())
}
