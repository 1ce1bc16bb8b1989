//! `shelfscan harvest`: one shard, end to end.

use anyhow::Context;
use shelfscan_core::{AppConfig, StoreOutcome};
use shelfscan_harvest::{
    harvest_store, run_shard, ChromiumLauncher, FsDebugSink, HarvestOptions, ShardPlan,
};

use crate::output;

/// Load the store list and target, harvest this run's shard, and write the
/// per-store files and the shard summary.
///
/// Store failures are recorded in the summary and never fail the run.
///
/// # Errors
///
/// Returns an error if the locations or target file is unusable, the shard
/// parameters are invalid, or the summary cannot be written.
pub(crate) async fn run_harvest(config: &AppConfig) -> anyhow::Result<()> {
    let stores = shelfscan_core::load_locations(&config.locations_path)?;
    let mut site = shelfscan_core::load_target_site(&config.target_path)?;
    if let Some(url) = &config.category_url {
        url::Url::parse(url).with_context(|| format!("category URL override '{url}'"))?;
        tracing::info!(url = %url, "overriding target category URL");
        site.category_url.clone_from(url);
    }
    let plan = ShardPlan::from_config(config);
    let range = plan.range(stores.len())?;

    tracing::info!(
        stores = stores.len(),
        shard = plan.shard_index,
        total_shards = plan.total_shards,
        first = range.start,
        end = range.end,
        "loaded store list"
    );

    let launcher = ChromiumLauncher::from_config(config);
    let options = HarvestOptions::from_config(config);
    let sink = FsDebugSink::new(&config.output_root);
    let output_root = config.output_root.as_path();

    let summary = run_shard(&stores, &plan, |store| {
        let (launcher, site, options, sink) = (&launcher, &site, &options, &sink);
        async move {
            let result = harvest_store(launcher, site, store, options, sink).await;
            let mut outcome = StoreOutcome::from_result(store, &result);
            if result.success {
                match output::write_store_output(output_root, store, &result.products) {
                    Ok(files) => {
                        outcome.json_path = Some(files.json.display().to_string());
                        outcome.csv_path = Some(files.csv.display().to_string());
                    }
                    Err(e) => {
                        let message = format!("{e:#}");
                        tracing::error!(store = %store.slug, error = %message, "failed to write store output");
                        outcome.success = false;
                        outcome.error = Some(message);
                    }
                }
            }
            outcome
        }
    })
    .await?;

    let path = output::write_summary(&config.output_root, &summary)
        .context("writing shard summary")?;

    println!(
        "shard {}/{}: {} of {} stores harvested, summary at {}",
        summary.shard_index,
        summary.total_shards,
        summary.succeeded(),
        summary.total_stores,
        path.display()
    );
    Ok(())
}
