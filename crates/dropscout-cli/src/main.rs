mod cache;
mod crawl;
mod products;
mod score;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cache::CacheCommands;
use crate::products::ProductCommands;

#[derive(Debug, Parser)]
#[command(name = "dropscout")]
#[command(about = "Dropshipping product discovery: crawl, score, and inspect products")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a crawl session over every configured source and store the result
    Crawl {
        /// Maximum records each source may contribute
        #[arg(long, default_value = "50")]
        max_per_source: usize,
        /// Run in the background and print progress until it completes
        #[arg(long)]
        watch: bool,
        /// Print the configured sources without crawling
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect or prune the response cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Query the stored product set
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Score a product record read from a JSON file
    Score {
        /// Path to a JSON-encoded product record
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = dropscout_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Crawl {
            max_per_source,
            watch,
            dry_run,
        }) => crawl::run_crawl(&config, max_per_source, watch, dry_run).await?,
        Some(Commands::Cache { command }) => cache::run_cache(&config, command).await?,
        Some(Commands::Products { command }) => products::run_products(&config, command)?,
        Some(Commands::Score { path }) => score::run_score(&path)?,
        None => println!("dropscout: no command given (try --help)"),
    }

    Ok(())
}
