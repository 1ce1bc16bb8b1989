use std::path::PathBuf;

/// Run-level settings resolved from the environment.
///
/// The four shard run parameters (`TOTAL_SHARDS`, `SHARD_INDEX`,
/// `CONCURRENCY`, `DEBUG`) keep their bare names so existing CI workflows can
/// keep exporting them; everything else is `SHELFSCAN_`-prefixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: String,
    pub locations_path: PathBuf,
    pub target_path: PathBuf,
    pub output_root: PathBuf,
    pub total_shards: usize,
    /// 1-based index of the shard this run processes.
    pub shard_index: usize,
    /// Stores per shard before the final shard absorbs the remainder.
    /// `0` selects a balanced `ceil(N / total_shards)` split.
    pub shard_size: usize,
    pub concurrency: usize,
    pub debug_capture: bool,
    pub first_item_timeout_secs: u64,
    pub stability_threshold: u32,
    pub max_load_rounds: u32,
    pub navigation_timeout_secs: u64,
    pub navigation_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Upper bound on one store's in-session work. `0` disables the bound.
    pub target_timeout_secs: u64,
    pub headless: bool,
    pub locale: String,
    /// Replaces the target file's `category_url` when set.
    pub category_url: Option<String>,
}
