pub mod app_config;
pub mod config;
pub mod error;
pub mod products;
pub mod stores;
pub mod summary;
pub mod target;

pub use app_config::AppConfig;
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use error::{ConfigError, PartitionError};
pub use products::{ExtractedProduct, HarvestResult, LoadState};
pub use stores::{load_locations, parse_locations, slugify, StoreContext, StoreLocation};
pub use summary::{ShardSummary, StoreOutcome};
pub use target::{load_target_site, parse_target_site, FieldSelectorSets, LoadMoreConfig, TargetSite};
