//! Static shard partitioning and the bounded-concurrency shard runner.

use std::future::Future;
use std::ops::Range;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use shelfscan_core::{AppConfig, PartitionError, ShardSummary, StoreContext, StoreOutcome};

/// Which slice of the store list this run owns, and how wide to fan out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardPlan {
    pub total_shards: usize,
    /// 1-based.
    pub shard_index: usize,
    /// Stores per shard; the last shard takes the remainder. `0` splits
    /// evenly.
    pub shard_size: usize,
    pub concurrency: usize,
}

impl ShardPlan {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            total_shards: config.total_shards,
            shard_index: config.shard_index,
            shard_size: config.shard_size,
            concurrency: config.concurrency,
        }
    }

    /// This plan's index range over `total_items` stores.
    ///
    /// # Errors
    ///
    /// See [`partition`].
    pub fn range(&self, total_items: usize) -> Result<Range<usize>, PartitionError> {
        partition(
            total_items,
            self.total_shards,
            self.shard_index,
            self.shard_size,
        )
    }
}

/// Contiguous index range for shard `shard_index` of `total_shards`.
///
/// Shard `k` covers `[(k-1)*size, k*size)` clipped to `total_items`, except
/// the final shard, which runs to the end of the list. With `shard_size == 0`
/// the size is `ceil(total_items / total_shards)`. Ranges of all shards are
/// disjoint and together cover `0..total_items`.
///
/// # Errors
///
/// Returns [`PartitionError`] when `total_shards` is zero or `shard_index` is
/// outside `1..=total_shards`.
pub fn partition(
    total_items: usize,
    total_shards: usize,
    shard_index: usize,
    shard_size: usize,
) -> Result<Range<usize>, PartitionError> {
    if total_shards == 0 {
        return Err(PartitionError::NoShards);
    }
    if shard_index == 0 || shard_index > total_shards {
        return Err(PartitionError::IndexOutOfRange {
            index: shard_index,
            total: total_shards,
        });
    }

    let size = if shard_size == 0 {
        total_items.div_ceil(total_shards)
    } else {
        shard_size
    };

    let start = (shard_index - 1).saturating_mul(size).min(total_items);
    let end = if shard_index == total_shards {
        total_items
    } else {
        shard_index.saturating_mul(size).min(total_items)
    };

    Ok(start..end)
}

/// The stores shard `plan` owns.
///
/// # Errors
///
/// See [`partition`].
pub fn shard_stores<'a>(
    stores: &'a [StoreContext],
    plan: &ShardPlan,
) -> Result<&'a [StoreContext], PartitionError> {
    Ok(&stores[plan.range(stores.len())?])
}

/// Run `process` over every store in the shard, at most `plan.concurrency`
/// at a time, and summarize.
///
/// A new store starts as soon as any running one finishes. `process` owns
/// per-store failure handling; whatever it returns is recorded and never
/// stops its siblings. Results are ordered by shard position.
///
/// # Errors
///
/// Returns [`PartitionError`] for an invalid plan, before any store runs.
pub async fn run_shard<'a, F, Fut>(
    stores: &'a [StoreContext],
    plan: &ShardPlan,
    process: F,
) -> Result<ShardSummary, PartitionError>
where
    F: Fn(&'a StoreContext) -> Fut,
    Fut: Future<Output = StoreOutcome>,
{
    let shard = shard_stores(stores, plan)?;

    let concurrency = if plan.concurrency == 0 {
        tracing::warn!("concurrency 0 requested, running stores one at a time");
        1
    } else {
        plan.concurrency
    };

    tracing::info!(
        shard = plan.shard_index,
        total_shards = plan.total_shards,
        stores = shard.len(),
        concurrency,
        "processing shard"
    );

    let mut results: Vec<(usize, StoreOutcome)> = stream::iter(shard.iter().enumerate())
        .map(|(position, store)| {
            let fut = process(store);
            async move { (position, fut.await) }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;
    results.sort_by_key(|(position, _)| *position);

    let summary = ShardSummary {
        shard_index: plan.shard_index,
        total_shards: plan.total_shards,
        concurrency,
        total_stores: shard.len(),
        timestamp: Utc::now(),
        results: results.into_iter().map(|(_, outcome)| outcome).collect(),
    };

    if summary.failed() > 0 {
        tracing::warn!(
            failed = summary.failed(),
            total = summary.total_stores,
            "some stores failed during harvest"
        );
    }

    Ok(summary)
}
