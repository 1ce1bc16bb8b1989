//! `shelfscan extract`: run the pipeline over a saved page.

use std::path::Path;

use anyhow::Context;
use serde_json::Map;
use shelfscan_core::{AppConfig, StoreContext};
use shelfscan_harvest::{harvest_store, HarvestOptions, NoDebugSink, StaticLauncher};

use crate::output;

/// Extract products from the HTML file at `html` using the configured target
/// selectors.
///
/// Prints the records as JSON, or writes the usual data files under
/// `output` when given.
///
/// # Errors
///
/// Returns an error if the file or target config cannot be read, extraction
/// fails, or output cannot be written.
pub(crate) async fn run_extract(
    config: &AppConfig,
    html: &Path,
    store_name: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let page = std::fs::read_to_string(html).with_context(|| format!("reading {}", html.display()))?;
    let site = shelfscan_core::load_target_site(&config.target_path)?;
    let store = StoreContext {
        name: store_name.to_string(),
        slug: shelfscan_core::slugify(store_name),
        city: None,
        metadata: Map::new(),
    };
    let options = HarvestOptions {
        target_timeout: None,
        debug_capture: false,
        ..HarvestOptions::from_config(config)
    };

    let launcher = StaticLauncher::new(page);
    let result = harvest_store(&launcher, &site, &store, &options, &NoDebugSink).await;
    if !result.success {
        anyhow::bail!(
            "extraction from {} failed: {}",
            html.display(),
            result.error.unwrap_or_default()
        );
    }

    match output {
        Some(root) => {
            let files = output::write_store_output(root, &store, &result.products)?;
            println!(
                "extracted {} products to {}",
                result.count(),
                files.json.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&result.products)?),
    }
    Ok(())
}
