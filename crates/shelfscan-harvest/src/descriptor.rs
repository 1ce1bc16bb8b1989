//! Serializable extraction rules.
//!
//! An [`ExtractionDescriptor`] is pure data: the item container selector plus
//! one ordered selector chain per output field. It crosses the surface
//! boundary as the argument of [`scripts::EXTRACT_ITEMS`], and
//! [`StaticPage`](crate::surface::StaticPage) interprets the same value, so
//! the rules behave identically with and without a browser.
//!
//! [`scripts::EXTRACT_ITEMS`]: crate::scripts::EXTRACT_ITEMS

use serde::{Deserialize, Serialize};
use shelfscan_core::TargetSite;

pub const TITLE: &str = "title";
pub const LINK: &str = "link";
/// Text of the anchor that produced [`LINK`]; a name fallback.
pub const LINK_TEXT: &str = "linkText";
pub const BRAND: &str = "brand";
pub const IMAGE: &str = "image";
pub const PRICE: &str = "price";
pub const BADGE: &str = "badge";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionDescriptor {
    pub item_selector: String,
    pub fields: Vec<FieldRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    pub name: String,
    pub selectors: Vec<String>,
    pub read: ReadMode,
    /// Also record the text of the element that produced the value, under
    /// this name. Null when that element has no text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_field: Option<String>,
}

/// How a matched element yields its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReadMode {
    /// Visible text, trimmed.
    Text,
    /// First non-empty attribute among `names`.
    Attribute { names: Vec<String> },
}

impl ExtractionDescriptor {
    /// Rules for `site`, reading item containers matched by `item_selector`.
    #[must_use]
    pub fn for_site(site: &TargetSite, item_selector: &str) -> Self {
        let fields = &site.fields;
        let text = |name: &str, selectors: &[String]| FieldRule {
            name: name.to_string(),
            selectors: selectors.to_vec(),
            read: ReadMode::Text,
            text_field: None,
        };
        let attribute = |name: &str, selectors: &[String], names: &[String]| FieldRule {
            name: name.to_string(),
            selectors: selectors.to_vec(),
            read: ReadMode::Attribute {
                names: names.to_vec(),
            },
            text_field: None,
        };

        Self {
            item_selector: item_selector.to_string(),
            fields: vec![
                text(TITLE, &fields.title),
                FieldRule {
                    text_field: Some(LINK_TEXT.to_string()),
                    ..attribute(LINK, &fields.link, &["href".to_string()])
                },
                text(BRAND, &fields.brand),
                attribute(IMAGE, &fields.image, &fields.image_attributes),
                text(PRICE, &fields.price),
                text(BADGE, &fields.badge),
            ],
        }
    }

    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }
}
