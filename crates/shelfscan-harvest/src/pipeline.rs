//! One store, end to end: session, navigation, load, extraction, dedup.

use std::time::Duration;

use shelfscan_core::{
    AppConfig, ExtractedProduct, HarvestResult, LoadState, StoreContext, TargetSite,
};
use url::Url;

use crate::cascade::resolve_item_selector;
use crate::debug::{capture, DebugSink};
use crate::dedup::DedupStore;
use crate::descriptor::ExtractionDescriptor;
use crate::error::HarvestError;
use crate::extract::{draft_product, read_items};
use crate::load::{load_to_completion, LoadReport, LoadSettings};
use crate::retry::retry_with_backoff;
use crate::surface::{RenderingSurface, SurfaceLauncher, WaitCondition};

/// Per-run knobs for [`harvest_store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOptions {
    pub load: LoadSettings,
    pub navigation_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// Bound on all in-session work for one store. `None` leaves it unbounded.
    pub target_timeout: Option<Duration>,
    pub debug_capture: bool,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            load: LoadSettings::default(),
            navigation_retries: 2,
            retry_backoff_base_secs: 2,
            target_timeout: None,
            debug_capture: false,
        }
    }
}

impl HarvestOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            load: LoadSettings {
                first_item_timeout: Duration::from_secs(config.first_item_timeout_secs),
                stability_threshold: config.stability_threshold,
                max_rounds: config.max_load_rounds,
                ..LoadSettings::default()
            },
            navigation_retries: config.navigation_retries,
            retry_backoff_base_secs: config.retry_backoff_base_secs,
            target_timeout: (config.target_timeout_secs > 0)
                .then(|| Duration::from_secs(config.target_timeout_secs)),
            debug_capture: config.debug_capture,
        }
    }
}

struct Harvest {
    products: Vec<ExtractedProduct>,
    load: LoadReport,
}

/// Harvest one store's listing.
///
/// Never fails: every per-store error becomes a failed [`HarvestResult`].
/// The session is closed on every path, including timeouts; a debug snapshot
/// is taken first when capture is enabled and the run failed.
pub async fn harvest_store<L, D>(
    launcher: &L,
    site: &TargetSite,
    store: &StoreContext,
    options: &HarvestOptions,
    debug_sink: &D,
) -> HarvestResult
where
    L: SurfaceLauncher,
    D: DebugSink + ?Sized,
{
    let base = match Url::parse(&site.base_url) {
        Ok(base) => base,
        Err(source) => {
            return failed(
                store,
                &HarvestError::InvalidBaseUrl {
                    url: site.base_url.clone(),
                    source,
                },
            )
        }
    };

    let surface = match launcher.launch().await {
        Ok(surface) => surface,
        Err(e) => return failed(store, &HarvestError::Session(e)),
    };

    let session = run_session(&surface, site, store, &base, options);
    let outcome = match options.target_timeout {
        Some(limit) => tokio::time::timeout(limit, session)
            .await
            .unwrap_or(Err(HarvestError::TargetTimeout {
                secs: limit.as_secs(),
            })),
        None => session.await,
    };

    let result = match outcome {
        Ok(harvest) => {
            if harvest.load.state == LoadState::Exhausted {
                tracing::warn!(
                    store = %store.slug,
                    rounds = harvest.load.rounds,
                    items = harvest.load.item_count,
                    "load round cap reached before the listing settled"
                );
            }
            tracing::info!(
                store = %store.slug,
                count = harvest.products.len(),
                rounds = harvest.load.rounds,
                clicks = harvest.load.load_more_clicks,
                "store harvested"
            );
            HarvestResult::succeeded(harvest.products, harvest.load.state, harvest.load.rounds)
        }
        Err(err) => {
            if options.debug_capture {
                let snapshot = capture(&surface).await;
                match debug_sink.persist(store, &snapshot) {
                    Ok(paths) => {
                        tracing::info!(store = %store.slug, files = paths.len(), "debug snapshot saved");
                    }
                    Err(e) => {
                        tracing::warn!(store = %store.slug, error = %e, "failed to save debug snapshot");
                    }
                }
            }
            failed(store, &err)
        }
    };

    if let Err(e) = surface.close().await {
        tracing::warn!(store = %store.slug, error = %e, "failed to close rendering session");
    }

    result
}

async fn run_session<S: RenderingSurface>(
    surface: &S,
    site: &TargetSite,
    store: &StoreContext,
    base: &Url,
    options: &HarvestOptions,
) -> Result<Harvest, HarvestError> {
    tracing::debug!(store = %store.slug, url = %site.category_url, "navigating");
    retry_with_backoff(
        options.navigation_retries,
        options.retry_backoff_base_secs,
        move || surface.navigate(&site.category_url, WaitCondition::NetworkIdle),
    )
    .await
    .map_err(|source| HarvestError::Navigation {
        url: site.category_url.clone(),
        source,
    })?;

    dismiss_consent(surface, &site.consent_selectors, &store.slug).await;

    let cascade = resolve_item_selector(surface, &site.item_container_selectors)
        .await
        .map_err(HarvestError::Extraction)?;
    if !cascade.has_coverage() {
        tracing::debug!(
            store = %store.slug,
            selector = %cascade.selector,
            "no item selector matched yet, waiting on the last candidate"
        );
    }

    let load = load_to_completion(
        surface,
        &cascade.selector,
        site.load_more.as_ref(),
        &options.load,
    )
    .await?;

    let descriptor = ExtractionDescriptor::for_site(site, &cascade.selector);
    let items = read_items(surface, &descriptor)
        .await
        .map_err(HarvestError::Extraction)?;

    let mut dedup = DedupStore::new(base.clone());
    for item in &items {
        dedup.insert(draft_product(item, site, base, &store.name));
    }
    tracing::debug!(
        store = %store.slug,
        containers = items.len(),
        unique = dedup.len(),
        "extracted"
    );

    Ok(Harvest {
        products: dedup.into_products(),
        load,
    })
}

/// Click the first consent button that is present. Failures are only logged;
/// the listing may still be readable behind the banner.
async fn dismiss_consent<S: RenderingSurface>(surface: &S, selectors: &[String], slug: &str) {
    for selector in selectors {
        let handles = match surface.query_all(selector).await {
            Ok(handles) => handles,
            Err(e) => {
                tracing::debug!(store = %slug, selector = %selector, error = %e, "consent lookup failed");
                continue;
            }
        };
        let Some(button) = handles.first() else {
            continue;
        };
        match surface.click(button).await {
            Ok(()) => {
                tracing::debug!(store = %slug, selector = %selector, "consent banner dismissed");
                return;
            }
            Err(e) => {
                tracing::debug!(store = %slug, selector = %selector, error = %e, "consent click failed");
            }
        }
    }
}

fn failed(store: &StoreContext, err: &HarvestError) -> HarvestResult {
    tracing::error!(store = %store.slug, error = %err, "store harvest failed");
    HarvestResult::failed(err.to_string())
}
