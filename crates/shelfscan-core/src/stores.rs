//! Store list loading: the shard units a harvest run iterates over.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ConfigError;

/// One store to harvest. Loaded once at start and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreContext {
    pub name: String,
    /// Filesystem-safe identifier; names the per-store output directory.
    pub slug: String,
    pub city: Option<String>,
    /// The full record as it appeared in the locations file.
    pub metadata: Map<String, Value>,
}

/// A physical store as discovered on a store-locator page. This is the shape
/// written to the locations file by `shelfscan discover`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreLocation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl StoreLocation {
    /// Identity used to collapse the same store listed twice on a locator page.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.name,
            self.address_line1.as_deref().unwrap_or(""),
            self.city
        )
        .to_lowercase()
    }
}

/// Generate a URL- and filesystem-safe slug.
///
/// Common Latin accents fold to their base letter, apostrophes vanish, and
/// every other run of non-alphanumerics becomes a single `-`.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.to_lowercase().chars() {
        let folded = fold_accent(c);
        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else if c == '\'' || c == '\u{2019}' {
            // "Arnie's" -> "arnies"
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Load the store list from a JSON locations file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, is not a JSON array of
/// objects, or declares the same `storeSlug` twice.
pub fn load_locations(path: &Path) -> Result<Vec<StoreContext>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocationsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_locations(&content)
}

/// Parse the contents of a locations file.
///
/// Missing names become `Store {n}` (1-based position). Missing slugs are
/// synthesized from `slug` or the name; a synthesized slug that collides with
/// an earlier one gets the city appended, then a numeric suffix.
///
/// # Errors
///
/// See [`load_locations`].
pub fn parse_locations(content: &str) -> Result<Vec<StoreContext>, ConfigError> {
    let value: Value = serde_json::from_str(content).map_err(ConfigError::LocationsFileParse)?;

    let Value::Array(entries) = value else {
        return Err(ConfigError::Validation(
            "locations file must be a JSON array".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(map) => records.push(map),
            other => {
                return Err(ConfigError::Validation(format!(
                    "location #{} must be an object, got {}",
                    index + 1,
                    json_kind(&other)
                )))
            }
        }
    }

    // Explicit slugs are reserved up front so synthesized ones route around them.
    let mut taken: HashSet<String> = HashSet::new();
    for record in &records {
        if let Some(slug) = non_empty_str(record, "storeSlug") {
            if !taken.insert(slug.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate storeSlug: '{slug}'"
                )));
            }
        }
    }

    let mut stores = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let name = non_empty_str(&record, "name")
            .or_else(|| non_empty_str(&record, "storeName"))
            .unwrap_or_else(|| format!("Store {}", index + 1));
        let city = non_empty_str(&record, "city");

        let slug = match non_empty_str(&record, "storeSlug") {
            Some(explicit) => explicit,
            None => {
                let seed = non_empty_str(&record, "slug").unwrap_or_else(|| name.clone());
                synthesize_slug(&seed, city.as_deref(), index, &mut taken)
            }
        };

        stores.push(StoreContext {
            name,
            slug,
            city,
            metadata: record,
        });
    }

    Ok(stores)
}

fn synthesize_slug(
    seed: &str,
    city: Option<&str>,
    index: usize,
    taken: &mut HashSet<String>,
) -> String {
    let mut base = slugify(seed);
    if base.is_empty() {
        base = format!("store-{}", index + 1);
    }

    if taken.insert(base.clone()) {
        return base;
    }

    if let Some(city_slug) = city.map(slugify).filter(|s| !s.is_empty()) {
        let with_city = format!("{base}-{city_slug}");
        if taken.insert(with_city.clone()) {
            return with_city;
        }
        base = with_city;
    }

    let mut n = 2usize;
    loop {
        let candidate = format!("{base}-{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn non_empty_str(record: &Map<String, Value>, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "stores_test.rs"]
mod tests;
