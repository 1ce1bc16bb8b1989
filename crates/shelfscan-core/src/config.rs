use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
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
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default; only malformed values fail.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
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
        raw.trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let log_level = or_default("SHELFSCAN_LOG_LEVEL", "info");
    let locations_path = PathBuf::from(or_default(
        "SHELFSCAN_LOCATIONS_PATH",
        "./data/locations.json",
    ));
    let target_path = PathBuf::from(or_default("SHELFSCAN_TARGET_PATH", "./config/target.yaml"));
    let output_root = PathBuf::from(or_default("SHELFSCAN_OUTPUT_ROOT", "./outputs"));

    let total_shards = parse_usize("TOTAL_SHARDS", "2")?;
    let shard_index = parse_usize("SHARD_INDEX", "1")?;
    let shard_size = parse_usize("SHARD_SIZE", "8")?;
    let concurrency = parse_usize("CONCURRENCY", "1")?;
    // DEBUG is an integer flag: only `1` turns capture on.
    let debug_capture = parse_u32("DEBUG", "0")? == 1;

    let first_item_timeout_secs = parse_u64("SHELFSCAN_FIRST_ITEM_TIMEOUT_SECS", "30")?;
    let stability_threshold = parse_u32("SHELFSCAN_STABILITY_THRESHOLD", "5")?;
    let max_load_rounds = parse_u32("SHELFSCAN_MAX_LOAD_ROUNDS", "200")?;
    let navigation_timeout_secs = parse_u64("SHELFSCAN_NAVIGATION_TIMEOUT_SECS", "60")?;
    let navigation_retries = parse_u32("SHELFSCAN_NAVIGATION_RETRIES", "2")?;
    let retry_backoff_base_secs = parse_u64("SHELFSCAN_RETRY_BACKOFF_BASE_SECS", "2")?;
    let target_timeout_secs = parse_u64("SHELFSCAN_TARGET_TIMEOUT_SECS", "0")?;
    let headless = parse_bool("SHELFSCAN_HEADLESS", "true")?;
    let locale = or_default("SHELFSCAN_LOCALE", "en-CA");
    // SPORTING_LIFE_CLEARANCE_URL is the name older CI jobs export.
    let category_url = ["SHELFSCAN_CATEGORY_URL", "SPORTING_LIFE_CLEARANCE_URL"]
        .into_iter()
        .find_map(|var| lookup(var).ok().filter(|v| !v.trim().is_empty()).map(|v| (var, v)));
    if let Some((var, url)) = &category_url {
        if url::Url::parse(url.trim()).is_err() {
            return Err(invalid(var, format!("expected an absolute URL, got '{url}'")));
        }
    }
    let category_url = category_url.map(|(_, url)| url.trim().to_string());

    if stability_threshold == 0 {
        return Err(invalid(
            "SHELFSCAN_STABILITY_THRESHOLD",
            "must be at least 1".to_string(),
        ));
    }
    if max_load_rounds == 0 {
        return Err(invalid(
            "SHELFSCAN_MAX_LOAD_ROUNDS",
            "must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        log_level,
        locations_path,
        target_path,
        output_root,
        total_shards,
        shard_index,
        shard_size,
        concurrency,
        debug_capture,
        first_item_timeout_secs,
        stability_threshold,
        max_load_rounds,
        navigation_timeout_secs,
        navigation_retries,
        retry_backoff_base_secs,
        target_timeout_secs,
        headless,
        locale,
        category_url,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
