//! Per-store data files and the shard summary.
//!
//! Layout under the output root:
//!
//! ```text
//! <root>/<slug>/data.json
//! <root>/<slug>/data.csv
//! <root>/_summary_shard_<i>.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use shelfscan_core::{ExtractedProduct, ShardSummary, StoreContext};

const CSV_HEADER: [&str; 8] = [
    "store",
    "name",
    "productUrl",
    "imageUrl",
    "brand",
    "currentPrice",
    "originalPrice",
    "badge",
];

/// Files written for one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreFiles {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Write `data.json` and `data.csv` for `store`, creating its directory.
///
/// # Errors
///
/// Returns an error if the directory or either file cannot be written.
pub(crate) fn write_store_output(
    root: &Path,
    store: &StoreContext,
    products: &[ExtractedProduct],
) -> anyhow::Result<StoreFiles> {
    let dir = root.join(&store.slug);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let json = dir.join("data.json");
    let body = serde_json::to_string_pretty(products)?;
    fs::write(&json, body).with_context(|| format!("writing {}", json.display()))?;

    let csv = dir.join("data.csv");
    fs::write(&csv, products_to_csv(products)?)
        .with_context(|| format!("writing {}", csv.display()))?;

    Ok(StoreFiles { json, csv })
}

/// Write `_summary_shard_<i>.json` under `root`.
///
/// # Errors
///
/// Returns an error if the root cannot be created or the file written.
pub(crate) fn write_summary(root: &Path, summary: &ShardSummary) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(root).with_context(|| format!("creating {}", root.display()))?;
    let path = root.join(format!("_summary_shard_{}.json", summary.shard_index));
    let body = serde_json::to_string_pretty(summary)?;
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Render `products` as CSV with a fixed header row. Fields are quoted only
/// when they need it.
///
/// # Errors
///
/// Returns an error if a record cannot be encoded.
pub(crate) fn products_to_csv(products: &[ExtractedProduct]) -> anyhow::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for product in products {
        let current = product.current_price.map(|p| p.to_string()).unwrap_or_default();
        let original = product.original_price.map(|p| p.to_string()).unwrap_or_default();
        writer.write_record([
            product.store.as_str(),
            product.name.as_str(),
            product.product_url.as_str(),
            product.image_url.as_deref().unwrap_or_default(),
            product.brand.as_deref().unwrap_or_default(),
            current.as_str(),
            original.as_str(),
            product.badge.as_deref().unwrap_or_default(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(csv::IntoInnerError::into_error)?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
#[path = "output_test.rs"]
mod tests;
