use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::products::{HarvestResult, LoadState};
use crate::stores::StoreContext;

/// Per-shard run report, written once after every pipeline in the shard has
/// finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardSummary {
    pub shard_index: usize,
    pub total_shards: usize,
    pub concurrency: usize,
    pub total_stores: usize,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<StoreOutcome>,
}

impl ShardSummary {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// One store's line in the shard summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOutcome {
    pub store_name: String,
    pub store_slug: String,
    pub success: bool,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_state: Option<LoadState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_rounds: Option<u32>,
}

impl StoreOutcome {
    /// Summarize a finished harvest. Output paths are filled in by whoever
    /// persists the products.
    #[must_use]
    pub fn from_result(store: &StoreContext, result: &HarvestResult) -> Self {
        Self {
            store_name: store.name.clone(),
            store_slug: store.slug.clone(),
            success: result.success,
            count: result.count(),
            json_path: None,
            csv_path: None,
            error: result.error.clone(),
            load_state: result.load_state,
            load_rounds: result.load_rounds,
        }
    }
}
