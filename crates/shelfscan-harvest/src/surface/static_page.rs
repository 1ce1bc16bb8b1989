//! A rendering surface over a fixed HTML document.
//!
//! Used by `shelfscan extract` to re-run extraction on a saved debug snapshot
//! and by tests. Nothing loads: scrolling and clicking change nothing, and
//! waits return immediately, so the load detector settles after its
//! stability threshold.

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Map, Value};

use crate::cascade::first_non_empty;
use crate::descriptor::{ExtractionDescriptor, FieldRule, ReadMode};
use crate::error::SurfaceError;
use crate::scripts;
use crate::surface::{RenderingSurface, SurfaceLauncher, WaitCondition};

/// Position of a matched element within its `query_all` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticHandle(pub usize);

pub struct StaticPage {
    document: Html,
}

impl StaticPage {
    #[must_use]
    pub fn new(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    fn select(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, SurfaceError> {
        let parsed = parse_selector(selector)?;
        Ok(self.document.select(&parsed).collect())
    }

    fn find_load_more(&self, args: &Value) -> Result<Value, SurfaceError> {
        let selector = args
            .get("selector")
            .and_then(Value::as_str)
            .ok_or_else(|| SurfaceError::Script("load-more lookup needs a selector".into()))?;
        let needle = args
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_lowercase)
            .unwrap_or_default();

        let index = self.select(selector)?.into_iter().position(|el| {
            let attrs = el.value();
            let disabled = attrs.attr("disabled").is_some()
                || attrs.attr("hidden").is_some()
                || attrs.attr("aria-disabled") == Some("true");
            !disabled && text_of(el).to_lowercase().contains(&needle)
        });

        Ok(index.map_or(json!(-1), |i| json!(i)))
    }

    fn extract_items(&self, descriptor: &ExtractionDescriptor) -> Result<Value, SurfaceError> {
        // Parse every selector up front so a bad one fails the whole call,
        // as querySelector would throw in a browser.
        let rules = descriptor
            .fields
            .iter()
            .map(|rule| {
                let parsed = rule
                    .selectors
                    .iter()
                    .map(|s| parse_selector(s))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((rule, parsed))
            })
            .collect::<Result<Vec<(&FieldRule, Vec<Selector>)>, SurfaceError>>()?;

        let items = self
            .select(&descriptor.item_selector)?
            .into_iter()
            .map(|card| {
                let mut fields = Map::new();
                for (rule, selectors) in &rules {
                    let hit = first_non_empty(selectors, |selector| {
                        let el = card.select(selector).next()?;
                        read_value(el, &rule.read).map(|value| (value, el))
                    });
                    if let Some(text_field) = &rule.text_field {
                        let text = hit
                            .as_ref()
                            .map(|(_, el)| text_of(*el))
                            .filter(|t| !t.is_empty());
                        fields.insert(text_field.clone(), text.map_or(Value::Null, Value::String));
                    }
                    let value = hit.map(|(value, _)| value);
                    fields.insert(rule.name.clone(), value.map_or(Value::Null, Value::String));
                }
                json!({ "fields": fields, "text": text_of(card) })
            })
            .collect();

        Ok(Value::Array(items))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, SurfaceError> {
    Selector::parse(selector).map_err(|_| SurfaceError::InvalidSelector {
        selector: selector.to_string(),
    })
}

/// Text nodes joined by single spaces, so adjacent inline children never run
/// together.
fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn read_value(el: ElementRef<'_>, mode: &ReadMode) -> Option<String> {
    match mode {
        ReadMode::Text => Some(text_of(el)).filter(|t| !t.is_empty()),
        ReadMode::Attribute { names } => first_non_empty(names, |name| {
            el.value()
                .attr(name)
                .map(str::trim)
                .filter(|v| !v.is_empty() && !v.starts_with("data:"))
                .map(str::to_string)
        }),
    }
}

impl RenderingSurface for StaticPage {
    type Handle = StaticHandle;

    async fn navigate(&self, url: &str, _wait: WaitCondition) -> Result<(), SurfaceError> {
        tracing::debug!(url, "static page ignores navigation");
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<StaticHandle>, SurfaceError> {
        Ok((0..self.select(selector)?.len()).map(StaticHandle).collect())
    }

    async fn count(&self, selector: &str) -> Result<usize, SurfaceError> {
        Ok(self.select(selector)?.len())
    }

    async fn evaluate(&self, script: &str, args: Value) -> Result<Value, SurfaceError> {
        match script {
            scripts::COUNT_MATCHES => {
                let selector = args
                    .get("selector")
                    .and_then(Value::as_str)
                    .ok_or_else(|| SurfaceError::Script("count needs a selector".to_string()))?;
                Ok(Value::from(self.select(selector)?.len()))
            }
            scripts::SCROLL_TO_BOTTOM => Ok(Value::Null),
            // a saved document carries no live globals
            scripts::FIND_STORE_GLOBALS => Ok(json!([])),
            scripts::FIND_LOAD_MORE => self.find_load_more(&args),
            scripts::EXTRACT_ITEMS => {
                let descriptor: ExtractionDescriptor = serde_json::from_value(args)
                    .map_err(|e| SurfaceError::Script(format!("bad descriptor: {e}")))?;
                self.extract_items(&descriptor)
            }
            _ => Err(SurfaceError::Unsupported("arbitrary script evaluation")),
        }
    }

    async fn click(&self, _handle: &StaticHandle) -> Result<(), SurfaceError> {
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, SurfaceError> {
        Ok(!self.select(selector)?.is_empty())
    }

    async fn wait_for_timeout(&self, _duration: Duration) {}

    async fn content(&self) -> Result<String, SurfaceError> {
        Ok(self.document.html())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SurfaceError> {
        Err(SurfaceError::Unsupported("screenshot"))
    }

    async fn close(self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// Hands out a fresh [`StaticPage`] over the same HTML for every launch.
#[derive(Debug, Clone)]
pub struct StaticLauncher {
    html: String,
}

impl StaticLauncher {
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl SurfaceLauncher for StaticLauncher {
    type Surface = StaticPage;

    async fn launch(&self) -> Result<StaticPage, SurfaceError> {
        Ok(StaticPage::new(&self.html))
    }
}
