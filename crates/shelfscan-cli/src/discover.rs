//! `shelfscan discover`: refresh the locations file from a store locator.

use std::path::Path;

use anyhow::Context;
use shelfscan_core::AppConfig;
use shelfscan_harvest::{discover_store_locations, ChromiumLauncher};

/// Scrape `url` and overwrite `output` with the stores found. Nothing is
/// written when the page yields no stores.
///
/// # Errors
///
/// Returns an error if the page cannot be loaded, holds no store records, or
/// the file cannot be written.
pub(crate) async fn run_discover(config: &AppConfig, url: &str, output: &Path) -> anyhow::Result<()> {
    let launcher = ChromiumLauncher::from_config(config);
    let stores = discover_store_locations(
        &launcher,
        url,
        config.navigation_retries,
        config.retry_backoff_base_secs,
    )
    .await?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(&stores)?;
    std::fs::write(output, body).with_context(|| format!("writing {}", output.display()))?;

    println!("saved {} store locations to {}", stores.len(), output.display());
    Ok(())
}
