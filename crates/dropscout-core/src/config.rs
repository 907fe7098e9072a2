use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>().map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("DROPSCOUT_ENV", "development"))?;
    let log_level = or_default("DROPSCOUT_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default(
        "DROPSCOUT_SOURCES_PATH",
        "./config/sources.yaml",
    ));
    let store_path = PathBuf::from(or_default("DROPSCOUT_STORE_PATH", "./data/products.json"));
    let cache_dir = PathBuf::from(or_default("DROPSCOUT_CACHE_DIR", "./cache"));
    let cache_ttl_secs = parse_u64("DROPSCOUT_CACHE_TTL_SECS", "3600")?;

    let scraper_request_timeout_secs = parse_u64("DROPSCOUT_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "DROPSCOUT_SCRAPER_USER_AGENT",
        "dropscout/0.1 (product-discovery)",
    );
    let scraper_max_retries = parse_u32("DROPSCOUT_SCRAPER_MAX_RETRIES", "2")?;
    let scraper_retry_backoff_base_ms =
        parse_u64("DROPSCOUT_SCRAPER_RETRY_BACKOFF_BASE_MS", "500")?;

    let rate_var = "DROPSCOUT_MAX_REQUESTS_PER_SEC";
    let max_requests_per_sec = or_default(rate_var, "2.0")
        .parse::<f64>()
        .map_err(|e| invalid(rate_var, e.to_string()))?;
    if !max_requests_per_sec.is_finite() || max_requests_per_sec < 0.0 {
        return Err(invalid(
            rate_var,
            format!("must be a finite, non-negative number; got {max_requests_per_sec}"),
        ));
    }

    let max_concurrent_sources = parse_usize("DROPSCOUT_MAX_CONCURRENT_SOURCES", "4")?;
    if max_concurrent_sources == 0 {
        return Err(invalid(
            "DROPSCOUT_MAX_CONCURRENT_SOURCES",
            "must be at least 1".to_string(),
        ));
    }
    let session_timeout_secs = parse_u64("DROPSCOUT_SESSION_TIMEOUT_SECS", "300")?;
    let min_viable_products = parse_usize("DROPSCOUT_MIN_VIABLE_PRODUCTS", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        sources_path,
        store_path,
        cache_dir,
        cache_ttl_secs,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_ms,
        max_requests_per_sec,
        max_concurrent_sources,
        session_timeout_secs,
        min_viable_products,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for values other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "DROPSCOUT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
