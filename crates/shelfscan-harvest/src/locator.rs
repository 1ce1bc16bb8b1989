//! Store-list discovery from a store-locator page.
//!
//! Store locators usually ship their data as JSON inside `<script>` tags or
//! leave it on a `window` global. Every script body is parsed as JSON (whole
//! body first, then any embedded `[{...}]` literal), live globals are read
//! through the surface, the JSON is walked for arrays of store-like objects,
//! and each object is flattened with per-field fallback chains.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use shelfscan_core::StoreLocation;

use crate::cascade::first_non_empty;
use crate::error::HarvestError;
use crate::retry::retry_with_backoff;
use crate::scripts;
use crate::surface::{RenderingSurface, SurfaceLauncher, WaitCondition};

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").expect("valid regex"));
static ARRAY_OF_OBJECTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*\{").expect("valid regex"));

/// Keys whose presence marks an object as a store record.
const STORE_MARKER_KEYS: [&str; 3] = ["address", "addressLine1", "city"];

/// Nested objects that may hold a store's address parts.
const ADDRESS_KEYS: [&str; 4] = ["address", "location", "storeAddress", "contactAddress"];

/// Open `locator_url` in a fresh session and extract its store list.
///
/// # Errors
///
/// - [`HarvestError::Session`] if no session could be started.
/// - [`HarvestError::Navigation`] if the page never loaded.
/// - [`HarvestError::Extraction`] if the DOM could not be read.
/// - [`HarvestError::NoLocations`] if the page held no store records.
pub async fn discover_store_locations<L: SurfaceLauncher>(
    launcher: &L,
    locator_url: &str,
    navigation_retries: u32,
    retry_backoff_base_secs: u64,
) -> Result<Vec<StoreLocation>, HarvestError> {
    let surface = launcher.launch().await.map_err(HarvestError::Session)?;

    let page = read_page(&surface, locator_url, navigation_retries, retry_backoff_base_secs).await;
    if let Err(e) = surface.close().await {
        tracing::warn!(error = %e, "failed to close rendering session");
    }

    let (html, globals) = page?;
    let stores = collect_store_locations(script_roots(&html).chain(std::iter::once(globals)));
    if stores.is_empty() {
        return Err(HarvestError::NoLocations {
            url: locator_url.to_string(),
        });
    }
    tracing::info!(url = locator_url, count = stores.len(), "store locations discovered");
    Ok(stores)
}

async fn read_page<S: RenderingSurface>(
    surface: &S,
    url: &str,
    retries: u32,
    backoff_base_secs: u64,
) -> Result<(String, Value), HarvestError> {
    retry_with_backoff(retries, backoff_base_secs, move || {
        surface.navigate(url, WaitCondition::NetworkIdle)
    })
    .await
    .map_err(|source| HarvestError::Navigation {
        url: url.to_string(),
        source,
    })?;

    let html = surface.content().await.map_err(HarvestError::Extraction)?;
    let globals = match surface.evaluate(scripts::FIND_STORE_GLOBALS, Value::Null).await {
        Ok(globals) => globals,
        Err(e) => {
            tracing::debug!(url, error = %e, "window globals unavailable, using scripts only");
            Value::Null
        }
    };
    Ok((html, globals))
}

/// Every distinct store record embedded in `html`'s scripts, in discovery
/// order. Records without a name or city are dropped; duplicates (same
/// name, first address line and city, ignoring case) keep the first.
#[must_use]
pub fn extract_store_locations(html: &str) -> Vec<StoreLocation> {
    collect_store_locations(script_roots(html))
}

/// JSON roots from every `<script>` body in `html` that looks like it holds
/// an object.
fn script_roots(html: &str) -> impl Iterator<Item = Value> + '_ {
    SCRIPT_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim()))
        .filter(|body| body.contains('{'))
        .flat_map(script_json_roots)
}

fn collect_store_locations(roots: impl IntoIterator<Item = Value>) -> Vec<StoreLocation> {
    let mut seen = HashSet::new();
    let mut stores = Vec::new();

    for root in roots {
        for array in find_store_arrays(&root) {
            for store in array.iter().filter_map(simplify_store) {
                if seen.insert(store.dedup_key()) {
                    stores.push(store);
                }
            }
        }
    }

    stores
}

/// JSON values held by one script body: the whole body if it parses,
/// otherwise every balanced `[{...}]` literal inside it.
fn script_json_roots(body: &str) -> Vec<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return vec![value];
    }

    let mut roots = Vec::new();
    let mut resume = 0;
    for m in ARRAY_OF_OBJECTS_RE.find_iter(body) {
        if m.start() < resume {
            continue;
        }
        if let Some((value, len)) = leading_json_value(&body[m.start()..]) {
            resume = m.start() + len;
            roots.push(value);
        }
    }
    roots
}

/// Parse the JSON value at the very start of `s`, ignoring whatever follows
/// it. Returns the value and the number of bytes it spans.
fn leading_json_value(s: &str) -> Option<(Value, usize)> {
    let mut stream = serde_json::Deserializer::from_str(s).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Some((value, stream.byte_offset())),
        _ => None,
    }
}

/// Depth-first walk collecting every array in which at least one element is
/// an object carrying a store marker key.
fn find_store_arrays(root: &Value) -> Vec<&Vec<Value>> {
    let mut found = Vec::new();
    let mut stack = vec![root];

    while let Some(current) = stack.pop() {
        match current {
            Value::Array(items) => {
                let looks_like_stores = items.iter().any(|item| {
                    item.as_object()
                        .is_some_and(|obj| STORE_MARKER_KEYS.iter().any(|k| obj.contains_key(*k)))
                });
                if looks_like_stores {
                    found.push(items);
                }
                stack.extend(items.iter().filter(|v| v.is_array() || v.is_object()));
            }
            Value::Object(map) => {
                stack.extend(map.values().filter(|v| v.is_array() || v.is_object()));
            }
            _ => {}
        }
    }

    found
}

/// Flatten one raw store object. `None` unless both a name and a city
/// resolve.
fn simplify_store(raw: &Value) -> Option<StoreLocation> {
    let obj = raw.as_object()?;
    let address = first_non_empty(ADDRESS_KEYS, |key| obj.get(key).and_then(Value::as_object));

    let name = pick(obj, &["name", "title", "storeName"])?;
    let city = pick(obj, &["city"]).or_else(|| pick_in(address, &["city", "town"]))?;

    // A plain-string `address` is the first address line.
    let address_line1 = pick(obj, &["addressLine1"])
        .or_else(|| pick_in(address, &["address1", "addressLine1", "line1", "street"]))
        .or_else(|| text(obj, "address"));

    Some(StoreLocation {
        name,
        hours: pick(obj, &["hoursText", "hours", "todayHours"]),
        address_line1,
        address_line2: pick(obj, &["addressLine2"])
            .or_else(|| pick_in(address, &["address2", "addressLine2", "line2"])),
        city,
        province: pick(obj, &["province", "state"])
            .or_else(|| pick_in(address, &["region", "province", "state"])),
        postal_code: pick(obj, &["postalCode"]).or_else(|| pick_in(address, &["postalCode", "zip"])),
        country: pick(obj, &["country"]).or_else(|| pick_in(address, &["country"])),
        phone: pick(obj, &["phone", "phoneNumber"])
            .or_else(|| pick_in(address, &["phone", "telephone"])),
        distance_km: first_non_empty(["distanceKm", "distance"], |key| {
            obj.get(key).and_then(Value::as_f64)
        }),
    })
}

fn pick(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_non_empty(keys, |key| text(obj, key))
}

fn pick_in(obj: Option<&Map<String, Value>>, keys: &[&str]) -> Option<String> {
    obj.and_then(|o| pick(o, keys))
}

/// Trimmed, non-empty text for `key`. Numbers and booleans are stringified;
/// objects, arrays and null are absent.
fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match obj.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}
