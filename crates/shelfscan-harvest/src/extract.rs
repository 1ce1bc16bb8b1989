//! Field extraction: raw per-container values in, draft records out.

use std::collections::HashMap;

use serde::Deserialize;
use shelfscan_core::TargetSite;
use url::Url;

use crate::cascade::first_non_empty;
use crate::dedup::canonical_url;
use crate::descriptor::{self, ExtractionDescriptor};
use crate::error::SurfaceError;
use crate::price::parse_prices;
use crate::scripts;
use crate::surface::RenderingSurface;

/// Values read from one item container. `None` means no selector in the
/// field's chain produced anything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawItemFields {
    #[serde(default)]
    pub fields: HashMap<String, Option<String>>,
    /// The container's full visible text.
    #[serde(default)]
    pub text: String,
}

impl RawItemFields {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Option::as_deref)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// A record before deduplication. `product_url` is absolute when present.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub store: String,
    pub name: String,
    pub product_url: Option<String>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub badge: Option<String>,
}

/// Run the descriptor in-page and decode the per-container values.
///
/// # Errors
///
/// Returns `SurfaceError::Script` if the page returns something other than
/// the expected list, or whatever the surface reports for the evaluation.
pub async fn read_items<S: RenderingSurface>(
    surface: &S,
    descriptor: &ExtractionDescriptor,
) -> Result<Vec<RawItemFields>, SurfaceError> {
    let args = serde_json::to_value(descriptor)
        .map_err(|e| SurfaceError::Script(format!("descriptor did not serialize: {e}")))?;
    let value = surface.evaluate(scripts::EXTRACT_ITEMS, args).await?;
    serde_json::from_value(value)
        .map_err(|e| SurfaceError::Script(format!("unexpected extraction result: {e}")))
}

/// Turn one container's raw values into a draft record.
#[must_use]
pub fn draft_product(
    item: &RawItemFields,
    site: &TargetSite,
    base: &Url,
    store_name: &str,
) -> ProductDraft {
    let product_url = item
        .field(descriptor::LINK)
        .and_then(|href| canonical_url(href, base));

    let name = first_non_empty([descriptor::TITLE, descriptor::LINK_TEXT], |field| {
        item.field(field).map(collapse_whitespace)
    })
    .or_else(|| product_url.as_ref().and_then(name_from_url))
    .or_else(|| product_url.as_ref().map(Url::to_string))
    .unwrap_or_default();

    let image_url = item
        .field(descriptor::IMAGE)
        .and_then(|src| canonical_url(src, base))
        .map(String::from);

    let quote = match item.field(descriptor::PRICE).map(parse_prices) {
        Some(quote) if quote.current.is_some() => quote,
        _ => parse_prices(&item.text),
    };

    let badge = item
        .field(descriptor::BADGE)
        .map(collapse_whitespace)
        .or_else(|| site.default_badge.clone());

    ProductDraft {
        store: store_name.to_string(),
        name,
        product_url: product_url.map(String::from),
        image_url,
        brand: item.field(descriptor::BRAND).map(collapse_whitespace),
        current_price: quote.current,
        original_price: quote.original,
        badge,
    }
}

/// Collapse every whitespace run to one space and trim the ends.
#[must_use]
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A readable label from the URL's last path segment:
/// `/p/trail-runner_2.html` becomes `trail runner 2`.
fn name_from_url(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())?;
    let stem = match segment.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => segment,
    };
    let label = collapse_whitespace(&stem.replace(['-', '_'], " "));
    (!label.is_empty()).then_some(label)
}
