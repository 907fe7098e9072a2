use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid score weights: {0}")]
    InvalidWeights(String),
}
