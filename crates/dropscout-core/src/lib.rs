//! Shared domain types and configuration for dropscout.

pub mod app_config;
pub mod config;
pub mod products;
pub mod sources;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{
    clamp_score, round_to, AdMetric, Category, ProductRecord, ScoreKind, SupplierPlatform,
    TrendPoint, TrendSignal, VideoMetric, SYNTHETIC_ID_PREFIX,
};
pub use sources::{load_sources, parse_sources, SearchPlatform, SourcesFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("invalid sources configuration: {0}")]
    Validation(String),
}
