//! Multi-factor "winning product" scoring.
//!
//! Five weighted signals (ad engagement, short-video virality, profit
//! margin, search trend volume, store saturation) combine into a single
//! 0–100 score. The engine is stateless; the same record always scores the
//! same.

pub mod engine;
pub mod error;

pub use engine::{DimensionScores, ScoreBreakdown, ScoreWeights, ScoringEngine};
pub use error::ScoringError;
