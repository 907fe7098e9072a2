use serde::{Deserialize, Serialize};

use dropscout_core::{clamp_score, round_to, AdMetric, ProductRecord, TrendSignal, VideoMetric};

use crate::error::ScoringError;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Ads: average interactions per reach, scaled so a 5% rate scores 100.
const FACEBOOK_SCALE: f64 = 2000.0;
/// Videos: interactions per view, scaled so a 10% ratio scores 100.
const TIKTOK_SCALE: f64 = 1000.0;

const DEFAULT_FACEBOOK: f64 = 0.0;
const DEFAULT_TIKTOK: f64 = 0.0;
const DEFAULT_MARGIN: f64 = 50.0;
const DEFAULT_TREND: f64 = 50.0;
const DEFAULT_SATURATION: f64 = 100.0;

/// Per-dimension weights. Validated to be non-negative and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreWeights {
    facebook_engagement: f64,
    tiktok_viral_ratio: f64,
    profit_margin: f64,
    trend_volume: f64,
    store_saturation: f64,
}

impl ScoreWeights {
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidWeights`] if any weight is negative or
    /// non-finite, or if the weights do not sum to 1.0.
    pub fn new(
        facebook_engagement: f64,
        tiktok_viral_ratio: f64,
        profit_margin: f64,
        trend_volume: f64,
        store_saturation: f64,
    ) -> Result<Self, ScoringError> {
        let weights = Self {
            facebook_engagement,
            tiktok_viral_ratio,
            profit_margin,
            trend_volume,
            store_saturation,
        };

        if let Some((name, value)) = weights
            .named()
            .into_iter()
            .find(|(_, w)| !w.is_finite() || *w < 0.0)
        {
            return Err(ScoringError::InvalidWeights(format!(
                "{name} weight must be a non-negative number, got {value}"
            )));
        }

        let sum: f64 = weights.named().iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }

        Ok(weights)
    }

    #[must_use]
    pub fn facebook_engagement(&self) -> f64 {
        self.facebook_engagement
    }

    #[must_use]
    pub fn tiktok_viral_ratio(&self) -> f64 {
        self.tiktok_viral_ratio
    }

    #[must_use]
    pub fn profit_margin(&self) -> f64 {
        self.profit_margin
    }

    #[must_use]
    pub fn trend_volume(&self) -> f64 {
        self.trend_volume
    }

    #[must_use]
    pub fn store_saturation(&self) -> f64 {
        self.store_saturation
    }

    /// `(dimension name, weight)` pairs in display order.
    #[must_use]
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("facebook_engagement", self.facebook_engagement),
            ("tiktok_viral_ratio", self.tiktok_viral_ratio),
            ("profit_margin", self.profit_margin),
            ("trend_volume", self.trend_volume),
            ("store_saturation", self.store_saturation),
        ]
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            facebook_engagement: 0.30,
            tiktok_viral_ratio: 0.25,
            profit_margin: 0.20,
            trend_volume: 0.10,
            store_saturation: 0.15,
        }
    }
}

/// Sub-scores, each in `[0, 100]` and rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub facebook_engagement: f64,
    pub tiktok_viral_ratio: f64,
    pub profit_margin: f64,
    pub trend_volume: f64,
    pub store_saturation: f64,
}

/// Full explanation of a record's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total_score: f64,
    pub breakdown: DimensionScores,
    pub weights: ScoreWeights,
    pub recommendations: Vec<String>,
}

/// Stateless composite scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    weights: ScoreWeights,
}

impl ScoringEngine {
    #[must_use]
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Weighted total in `[0, 100]`, rounded to two decimals.
    #[must_use]
    pub fn score(&self, record: &ProductRecord) -> f64 {
        self.total(&Self::dimension_scores(record))
    }

    /// Scores `record` in place through [`ProductRecord::assign_score`].
    pub fn apply(&self, record: &mut ProductRecord) -> f64 {
        let score = self.score(record);
        tracing::trace!(id = %record.id, previous = record.score, score, "scored record");
        record.assign_score(score);
        score
    }

    #[must_use]
    pub fn breakdown(&self, record: &ProductRecord) -> ScoreBreakdown {
        let scores = Self::dimension_scores(record);
        ScoreBreakdown {
            total_score: self.total(&scores),
            breakdown: scores,
            weights: self.weights,
            recommendations: recommendations(&scores),
        }
    }

    #[must_use]
    pub fn dimension_scores(record: &ProductRecord) -> DimensionScores {
        DimensionScores {
            facebook_engagement: facebook_engagement(&record.facebook_ads),
            tiktok_viral_ratio: tiktok_viral_ratio(&record.tiktok_mentions),
            profit_margin: profit_margin(record),
            trend_volume: trend_volume(record.trend_data.as_ref()),
            store_saturation: store_saturation(record.similar_stores.len()),
        }
    }

    fn total(&self, scores: &DimensionScores) -> f64 {
        let w = &self.weights;
        let sum = w.facebook_engagement * scores.facebook_engagement
            + w.tiktok_viral_ratio * scores.tiktok_viral_ratio
            + w.profit_margin * scores.profit_margin
            + w.trend_volume * scores.trend_volume
            + w.store_saturation * scores.store_saturation;
        clamp_score(round_to(sum, 2))
    }
}

/// Rounds and clamps a raw sub-score, substituting `default` for NaN/∞.
fn finish(raw: f64, default: f64) -> f64 {
    if raw.is_finite() {
        clamp_score(round_to(raw, 2))
    } else {
        default
    }
}

#[allow(clippy::cast_precision_loss)]
fn facebook_engagement(ads: &[AdMetric]) -> f64 {
    if ads.is_empty() {
        return DEFAULT_FACEBOOK;
    }
    let total: f64 = ads
        .iter()
        .map(|ad| {
            let interactions = ad.likes.saturating_add(ad.comments).saturating_add(ad.shares);
            interactions as f64 / ad.reach.max(1) as f64
        })
        .sum();
    let average = total / ads.len() as f64;
    finish((average * FACEBOOK_SCALE).min(100.0), DEFAULT_FACEBOOK)
}

#[allow(clippy::cast_precision_loss)]
fn tiktok_viral_ratio(videos: &[VideoMetric]) -> f64 {
    if videos.is_empty() {
        return DEFAULT_TIKTOK;
    }
    let total: f64 = videos
        .iter()
        .filter(|video| video.views > 0)
        .map(|video| {
            let interactions = video
                .likes
                .saturating_add(video.shares)
                .saturating_add(video.comments);
            (interactions as f64 / video.views as f64 * TIKTOK_SCALE).min(100.0)
        })
        .sum();
    finish(total / videos.len() as f64, DEFAULT_TIKTOK)
}

fn profit_margin(record: &ProductRecord) -> f64 {
    let Some(supplier) = record.min_supplier_price() else {
        return DEFAULT_MARGIN;
    };
    if !supplier.is_finite() || supplier <= 0.0 {
        return DEFAULT_MARGIN;
    }
    if !record.price.is_finite() || record.price <= 0.0 {
        return 0.0;
    }

    let margin = (record.price - supplier) / record.price * 100.0;
    let raw = if margin < 0.0 {
        0.0
    } else if margin < 50.0 {
        margin * 2.0
    } else {
        // Margins past 50% lose a point per percent.
        100.0 - (margin - 50.0)
    };
    finish(raw, DEFAULT_MARGIN)
}

fn trend_volume(trend: Option<&TrendSignal>) -> f64 {
    trend.map_or(DEFAULT_TREND, |t| finish(t.trend_score, DEFAULT_TREND))
}

fn store_saturation(competitors: usize) -> f64 {
    match competitors {
        0..=5 => DEFAULT_SATURATION,
        6..=20 => 80.0,
        21..=50 => 60.0,
        51..=100 => 40.0,
        _ => 20.0,
    }
}

fn recommendations(scores: &DimensionScores) -> Vec<String> {
    let checks = [
        (
            scores.facebook_engagement < 30.0,
            "Low Facebook engagement: improve ad creative",
        ),
        (
            scores.tiktok_viral_ratio < 25.0,
            "Low TikTok virality: focus on trending hashtags and content",
        ),
        (
            scores.profit_margin < 40.0,
            "Low profit margin: negotiate supplier pricing",
        ),
        (
            scores.trend_volume < 30.0,
            "Low search interest: consider different keywords",
        ),
        (
            scores.store_saturation < 40.0,
            "High market saturation: consider niche differentiation",
        ),
    ];
    checks
        .into_iter()
        .filter(|(triggered, _)| *triggered)
        .map(|(_, message)| message.to_owned())
        .collect()
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
