use serde::{Deserialize, Serialize};

/// One listing record read from a category page, deduplicated by
/// `product_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedProduct {
    /// Display name of the store the record was harvested for.
    pub store: String,
    /// Never empty: falls back to a URL-derived label when the tile has no title.
    pub name: String,
    /// Absolute, fragment-free listing URL. The record's identity.
    pub product_url: String,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub badge: Option<String>,
}

/// Where the load-completion loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// The item count stopped growing for the configured number of rounds.
    Stable,
    /// The round cap was hit while the page was still growing.
    Exhausted,
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Outcome of one store's harvest. Built once at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestResult {
    pub success: bool,
    pub products: Vec<ExtractedProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_state: Option<LoadState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_rounds: Option<u32>,
}

impl HarvestResult {
    #[must_use]
    pub fn succeeded(products: Vec<ExtractedProduct>, load_state: LoadState, rounds: u32) -> Self {
        Self {
            success: true,
            products,
            error: None,
            load_state: Some(load_state),
            load_rounds: Some(rounds),
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            products: Vec::new(),
            error: Some(error.into()),
            load_state: None,
            load_rounds: None,
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.products.len()
    }
}
