use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One category page to harvest, plus the selector knowledge needed to read it.
///
/// Selector lists are ordered most-specific first; the harvester walks each
/// list and takes the first candidate that yields something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSite {
    /// Absolute origin that relative listing and image URLs resolve against.
    pub base_url: String,
    pub category_url: String,
    pub item_container_selectors: Vec<String>,
    /// Cookie or consent banner buttons, clicked once after navigation if
    /// present. Missing banners are not an error.
    #[serde(default)]
    pub consent_selectors: Vec<String>,
    #[serde(default)]
    pub load_more: Option<LoadMoreConfig>,
    /// Badge attached to every record whose container carries no badge node.
    #[serde(default)]
    pub default_badge: Option<String>,
    pub fields: FieldSelectorSets,
}

/// Ordered fallback selectors for each output field, evaluated inside one
/// item container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSelectorSets {
    #[serde(default)]
    pub title: Vec<String>,
    pub link: Vec<String>,
    #[serde(default)]
    pub brand: Vec<String>,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default = "default_image_attributes")]
    pub image_attributes: Vec<String>,
    #[serde(default)]
    pub price: Vec<String>,
    #[serde(default)]
    pub badge: Vec<String>,
}

/// A "load more" affordance: any element matching one of `selectors` whose
/// visible text contains `text` (case-insensitive). Without `text` the first
/// visible, enabled match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadMoreConfig {
    pub selectors: Vec<String>,
    #[serde(default)]
    pub text: Option<String>,
}

fn default_image_attributes() -> Vec<String> {
    vec!["src".to_string(), "data-src".to_string()]
}

/// Load and validate a target site definition from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, is not valid YAML for a
/// [`TargetSite`], or fails validation.
pub fn load_target_site(path: &Path) -> Result<TargetSite, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_target_site(&content)
}

/// Parse and validate a target site definition from YAML text.
///
/// # Errors
///
/// See [`load_target_site`].
pub fn parse_target_site(content: &str) -> Result<TargetSite, ConfigError> {
    let site: TargetSite = serde_yaml::from_str(content).map_err(ConfigError::TargetFileParse)?;
    validate_target_site(&site)?;
    Ok(site)
}

fn validate_target_site(site: &TargetSite) -> Result<(), ConfigError> {
    match url::Url::parse(&site.base_url) {
        Ok(url) if !url.cannot_be_a_base() => {}
        _ => {
            return Err(ConfigError::Validation(format!(
                "base_url must be an absolute URL, got '{}'",
                site.base_url
            )))
        }
    }

    if url::Url::parse(&site.category_url).is_err() {
        return Err(ConfigError::Validation(format!(
            "category_url must be an absolute URL, got '{}'",
            site.category_url
        )));
    }

    if !has_selector(&site.item_container_selectors) {
        return Err(ConfigError::Validation(
            "item_container_selectors must list at least one selector".to_string(),
        ));
    }

    if !has_selector(&site.fields.link) {
        return Err(ConfigError::Validation(
            "fields.link must list at least one selector".to_string(),
        ));
    }

    if let Some(load_more) = &site.load_more {
        if !has_selector(&load_more.selectors) {
            return Err(ConfigError::Validation(
                "load_more.selectors must list at least one selector".to_string(),
            ));
        }
    }

    Ok(())
}

fn has_selector(list: &[String]) -> bool {
    list.iter().any(|s| !s.trim().is_empty())
}
