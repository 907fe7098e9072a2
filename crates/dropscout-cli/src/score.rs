//! `score` command: composite score and breakdown for a record file.

use std::path::Path;

use anyhow::Context;

use dropscout_core::ProductRecord;
use dropscout_scoring::ScoringEngine;

/// # Errors
///
/// Returns an error if the file cannot be read or is not a product record.
pub(crate) fn run_score(path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record: ProductRecord = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a product record", path.display()))?;

    let breakdown = ScoringEngine::default().breakdown(&record);
    println!("{}: {:.1}", record.title, breakdown.total_score);
    for ((name, weight), value) in breakdown.weights.named().into_iter().zip([
        breakdown.breakdown.facebook_engagement,
        breakdown.breakdown.tiktok_viral_ratio,
        breakdown.breakdown.profit_margin,
        breakdown.breakdown.trend_volume,
        breakdown.breakdown.store_saturation,
    ]) {
        println!("  {name:<22}{value:>7.2}  x {weight:.2}");
    }
    for recommendation in &breakdown.recommendations {
        println!("  - {recommendation}");
    }
    Ok(())
}
