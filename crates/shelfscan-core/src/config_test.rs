use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

fn config_with(pairs: &[(&'static str, &'static str)]) -> Result<AppConfig, ConfigError> {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    build_app_config(lookup_from_map(&map))
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let cfg = config_with(&[]).unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.locations_path.to_str(), Some("./data/locations.json"));
    assert_eq!(cfg.target_path.to_str(), Some("./config/target.yaml"));
    assert_eq!(cfg.output_root.to_str(), Some("./outputs"));
    assert_eq!(cfg.total_shards, 2);
    assert_eq!(cfg.shard_index, 1);
    assert_eq!(cfg.shard_size, 8);
    assert_eq!(cfg.concurrency, 1);
    assert!(!cfg.debug_capture);
    assert_eq!(cfg.first_item_timeout_secs, 30);
    assert_eq!(cfg.stability_threshold, 5);
    assert_eq!(cfg.max_load_rounds, 200);
    assert_eq!(cfg.navigation_timeout_secs, 60);
    assert_eq!(cfg.navigation_retries, 2);
    assert_eq!(cfg.retry_backoff_base_secs, 2);
    assert_eq!(cfg.target_timeout_secs, 0);
    assert!(cfg.headless);
    assert_eq!(cfg.locale, "en-CA");
    assert!(cfg.category_url.is_none());
}

#[test]
fn category_url_override_prefers_prefixed_name() {
    let cfg = config_with(&[(
        "SPORTING_LIFE_CLEARANCE_URL",
        "https://www.sportinglife.ca/en-CA/clearance/footwear/",
    )])
    .unwrap();
    assert_eq!(
        cfg.category_url.as_deref(),
        Some("https://www.sportinglife.ca/en-CA/clearance/footwear/")
    );

    let cfg = config_with(&[
        ("SPORTING_LIFE_CLEARANCE_URL", "https://a.example/old"),
        ("SHELFSCAN_CATEGORY_URL", " https://a.example/new "),
    ])
    .unwrap();
    assert_eq!(cfg.category_url.as_deref(), Some("https://a.example/new"));
}

#[test]
fn category_url_override_must_be_absolute() {
    let result = config_with(&[("SHELFSCAN_CATEGORY_URL", "/en-CA/clearance/")]);
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHELFSCAN_CATEGORY_URL"),
        "expected InvalidEnvVar(SHELFSCAN_CATEGORY_URL), got: {result:?}"
    );
}

#[test]
fn shard_parameters_override() {
    let cfg = config_with(&[
        ("TOTAL_SHARDS", "3"),
        ("SHARD_INDEX", "2"),
        ("SHARD_SIZE", "0"),
        ("CONCURRENCY", "4"),
    ])
    .unwrap();
    assert_eq!(cfg.total_shards, 3);
    assert_eq!(cfg.shard_index, 2);
    assert_eq!(cfg.shard_size, 0);
    assert_eq!(cfg.concurrency, 4);
}

#[test]
fn shard_index_invalid_is_rejected() {
    let result = config_with(&[("SHARD_INDEX", "first")]);
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHARD_INDEX"),
        "expected InvalidEnvVar(SHARD_INDEX), got: {result:?}"
    );
}

#[test]
fn total_shards_negative_is_rejected() {
    let result = config_with(&[("TOTAL_SHARDS", "-2")]);
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TOTAL_SHARDS"),
        "expected InvalidEnvVar(TOTAL_SHARDS), got: {result:?}"
    );
}

#[test]
fn debug_flag_only_enabled_by_one() {
    assert!(config_with(&[("DEBUG", "1")]).unwrap().debug_capture);
    assert!(!config_with(&[("DEBUG", "0")]).unwrap().debug_capture);
    assert!(!config_with(&[("DEBUG", "2")]).unwrap().debug_capture);
}

#[test]
fn debug_flag_non_integer_is_rejected() {
    let result = config_with(&[("DEBUG", "yes")]);
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DEBUG"),
        "expected InvalidEnvVar(DEBUG), got: {result:?}"
    );
}

#[test]
fn concurrency_tolerates_surrounding_whitespace() {
    let cfg = config_with(&[("CONCURRENCY", " 3 ")]).unwrap();
    assert_eq!(cfg.concurrency, 3);
}

#[test]
fn stability_threshold_zero_is_rejected() {
    let result = config_with(&[("SHELFSCAN_STABILITY_THRESHOLD", "0")]);
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHELFSCAN_STABILITY_THRESHOLD"),
        "expected InvalidEnvVar(SHELFSCAN_STABILITY_THRESHOLD), got: {result:?}"
    );
}

#[test]
fn max_load_rounds_zero_is_rejected() {
    let result = config_with(&[("SHELFSCAN_MAX_LOAD_ROUNDS", "0")]);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHELFSCAN_MAX_LOAD_ROUNDS"
    ));
}

#[test]
fn headless_accepts_word_booleans() {
    assert!(!config_with(&[("SHELFSCAN_HEADLESS", "false")]).unwrap().headless);
    assert!(!config_with(&[("SHELFSCAN_HEADLESS", "OFF")]).unwrap().headless);
    assert!(config_with(&[("SHELFSCAN_HEADLESS", "yes")]).unwrap().headless);
}

#[test]
fn headless_rejects_garbage() {
    let result = config_with(&[("SHELFSCAN_HEADLESS", "maybe")]);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHELFSCAN_HEADLESS"
    ));
}

#[test]
fn load_tuning_overrides() {
    let cfg = config_with(&[
        ("SHELFSCAN_FIRST_ITEM_TIMEOUT_SECS", "10"),
        ("SHELFSCAN_STABILITY_THRESHOLD", "3"),
        ("SHELFSCAN_MAX_LOAD_ROUNDS", "40"),
        ("SHELFSCAN_TARGET_TIMEOUT_SECS", "900"),
    ])
    .unwrap();
    assert_eq!(cfg.first_item_timeout_secs, 10);
    assert_eq!(cfg.stability_threshold, 3);
    assert_eq!(cfg.max_load_rounds, 40);
    assert_eq!(cfg.target_timeout_secs, 900);
}

#[test]
fn navigation_retry_invalid_is_rejected() {
    let result = config_with(&[("SHELFSCAN_NAVIGATION_RETRIES", "many")]);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHELFSCAN_NAVIGATION_RETRIES"
    ));
}

#[test]
fn paths_override() {
    let cfg = config_with(&[
        ("SHELFSCAN_LOCATIONS_PATH", "/tmp/stores.json"),
        ("SHELFSCAN_OUTPUT_ROOT", "/tmp/out"),
    ])
    .unwrap();
    assert_eq!(cfg.locations_path.to_str(), Some("/tmp/stores.json"));
    assert_eq!(cfg.output_root.to_str(), Some("/tmp/out"));
}
