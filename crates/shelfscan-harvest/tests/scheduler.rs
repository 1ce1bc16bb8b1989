//! Shard runner concurrency and failure isolation.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{site, store};
use shelfscan_core::{HarvestResult, LoadState, PartitionError, StoreContext, StoreOutcome};
use shelfscan_harvest::{
    harvest_store, run_shard, HarvestOptions, LoadSettings, NoDebugSink, ShardPlan,
    StaticLauncher,
};

fn stores(n: usize) -> Vec<StoreContext> {
    (1..=n).map(|i| store(&format!("Store {i}"))).collect()
}

fn plan(concurrency: usize) -> ShardPlan {
    ShardPlan {
        total_shards: 1,
        shard_index: 1,
        shard_size: 0,
        concurrency,
    }
}

#[derive(Default)]
struct Gauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn never_more_than_concurrency_pipelines_at_once() {
    let all = stores(5);
    let gauge = Arc::new(Gauge::default());
    let durations = [40u64, 10, 30, 5, 20];

    let summary = run_shard(&all, &plan(2), |store| {
        let gauge = Arc::clone(&gauge);
        let position = all.iter().position(|s| s.slug == store.slug).unwrap_or(0);
        let pause = Duration::from_millis(durations[position]);
        async move {
            gauge.enter();
            tokio::time::sleep(pause).await;
            gauge.leave();
            StoreOutcome::from_result(store, &HarvestResult::succeeded(Vec::new(), LoadState::Stable, 1))
        }
    })
    .await
    .unwrap();

    assert_eq!(gauge.peak.load(Ordering::SeqCst), 2);
    assert_eq!(summary.total_stores, 5);
    assert_eq!(summary.succeeded(), 5);
    assert_eq!(summary.concurrency, 2);
}

#[tokio::test]
async fn failures_do_not_stop_siblings_and_order_is_kept() {
    let all = stores(4);

    let summary = run_shard(&all, &plan(3), |store| async move {
        let result = if store.slug == "store-2" {
            HarvestResult::failed("navigation to https://shop.example.com failed")
        } else {
            tokio::time::sleep(Duration::from_millis(5)).await;
            HarvestResult::succeeded(Vec::new(), LoadState::Stable, 5)
        };
        StoreOutcome::from_result(store, &result)
    })
    .await
    .unwrap();

    let slugs: Vec<&str> = summary.results.iter().map(|r| r.store_slug.as_str()).collect();
    assert_eq!(slugs, ["store-1", "store-2", "store-3", "store-4"]);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.results[1].success);
    assert!(summary.results[1].error.is_some());
}

#[tokio::test]
async fn only_the_shard_slice_runs() {
    let all = stores(13);
    let processed = AtomicUsize::new(0);
    let shard_two = ShardPlan {
        total_shards: 2,
        shard_index: 2,
        shard_size: 8,
        concurrency: 4,
    };

    let summary = run_shard(&all, &shard_two, |store| {
        processed.fetch_add(1, Ordering::SeqCst);
        async move { StoreOutcome::from_result(store, &HarvestResult::failed("skipped")) }
    })
    .await
    .unwrap();

    assert_eq!(processed.load(Ordering::SeqCst), 5);
    assert_eq!(summary.results[0].store_slug, "store-9");
    assert_eq!(summary.shard_index, 2);
    assert_eq!(summary.total_shards, 2);
}

#[tokio::test]
async fn invalid_plan_runs_nothing() {
    let all = stores(3);
    let processed = AtomicUsize::new(0);
    let bad = ShardPlan {
        total_shards: 2,
        shard_index: 3,
        shard_size: 8,
        concurrency: 1,
    };

    let err = run_shard(&all, &bad, |store| {
        processed.fetch_add(1, Ordering::SeqCst);
        async move { StoreOutcome::from_result(store, &HarvestResult::failed("unreachable")) }
    })
    .await
    .unwrap_err();

    assert_eq!(err, PartitionError::IndexOutOfRange { index: 3, total: 2 });
    assert_eq!(processed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_concurrency_runs_serially() {
    let all = stores(3);
    let gauge = Arc::new(Gauge::default());

    let summary = run_shard(&all, &plan(0), |store| {
        let gauge = Arc::clone(&gauge);
        async move {
            gauge.enter();
            tokio::time::sleep(Duration::from_millis(5)).await;
            gauge.leave();
            StoreOutcome::from_result(store, &HarvestResult::succeeded(Vec::new(), LoadState::Stable, 1))
        }
    })
    .await
    .unwrap();

    assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
    assert_eq!(summary.concurrency, 1);
}

#[tokio::test]
async fn shard_over_static_pages_summarizes_every_store() {
    let launcher = StaticLauncher::new(
        r#"<ul><li class="tile"><a href="/a.html"><h3>Tent</h3></a>$99.00</li></ul>"#,
    );
    let target = site();
    let options = HarvestOptions {
        load: LoadSettings {
            stability_threshold: 1,
            ..LoadSettings::default()
        },
        ..HarvestOptions::default()
    };
    let all = stores(3);

    let summary = run_shard(&all, &plan(2), |store| {
        let (launcher, target, options) = (&launcher, &target, &options);
        async move {
            let result = harvest_store(launcher, target, store, options, &NoDebugSink).await;
            StoreOutcome::from_result(store, &result)
        }
    })
    .await
    .unwrap();

    assert_eq!(summary.succeeded(), 3);
    assert!(summary.results.iter().all(|r| r.count == 1));
    assert_eq!(summary.results[2].load_rounds, Some(1));
}
