use std::collections::HashSet;

use shelfscan_core::ExtractedProduct;
use url::Url;

use crate::extract::ProductDraft;

/// Absolute, fragment-free form of `raw` resolved against `base`.
///
/// `None` for blank input and for anything that does not resolve to an
/// `http(s)` URL (`javascript:`, `mailto:`, ...).
#[must_use]
pub fn canonical_url(raw: &str, base: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut url = base.join(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// First-seen-wins store keyed by canonical product URL.
#[derive(Debug)]
pub struct DedupStore {
    base: Url,
    seen: HashSet<String>,
    products: Vec<ExtractedProduct>,
}

impl DedupStore {
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self {
            base,
            seen: HashSet::new(),
            products: Vec::new(),
        }
    }

    /// Keep `draft` unless it has no resolvable URL or its URL was already
    /// seen. Returns whether it was kept.
    pub fn insert(&mut self, draft: ProductDraft) -> bool {
        let Some(url) = draft
            .product_url
            .as_deref()
            .and_then(|raw| canonical_url(raw, &self.base))
        else {
            return false;
        };

        let key = url.to_string();
        if !self.seen.insert(key.clone()) {
            return false;
        }

        self.products.push(ExtractedProduct {
            store: draft.store,
            name: draft.name,
            product_url: key,
            image_url: draft.image_url,
            brand: draft.brand,
            current_price: draft.current_price,
            original_price: draft.original_price,
            badge: draft.badge,
        });
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Kept records in first-seen order.
    #[must_use]
    pub fn into_products(self) -> Vec<ExtractedProduct> {
        self.products
    }
}

/// Deduplicate `drafts` in one pass.
#[must_use]
pub fn dedup_products<I>(drafts: I, base: &Url) -> Vec<ExtractedProduct>
where
    I: IntoIterator<Item = ProductDraft>,
{
    let mut store = DedupStore::new(base.clone());
    for draft in drafts {
        store.insert(draft);
    }
    store.into_products()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.example.com/en-CA/clearance/").unwrap()
    }

    fn draft(name: &str, url: Option<&str>) -> ProductDraft {
        ProductDraft {
            store: "Laval".to_string(),
            name: name.to_string(),
            product_url: url.map(str::to_string),
            image_url: None,
            brand: None,
            current_price: None,
            original_price: None,
            badge: None,
        }
    }

    #[test]
    fn canonical_url_resolves_relative_and_drops_fragment() {
        let url = canonical_url("/p/1.html#reviews", &base()).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/p/1.html");
        let url = canonical_url("tent.html", &base()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://shop.example.com/en-CA/clearance/tent.html"
        );
    }

    #[test]
    fn canonical_url_rejects_blank_and_non_http() {
        assert!(canonical_url("  ", &base()).is_none());
        assert!(canonical_url("javascript:void(0)", &base()).is_none());
        assert!(canonical_url("mailto:help@example.com", &base()).is_none());
    }

    #[test]
    fn first_occurrence_wins_in_input_order() {
        let products = dedup_products(
            vec![
                draft("first", Some("/a.html")),
                draft("second", Some("/b.html")),
                draft("dup", Some("https://shop.example.com/a.html")),
                draft("dup-fragment", Some("/b.html#top")),
            ],
            &base(),
        );
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(products[0].product_url, "https://shop.example.com/a.html");
    }

    #[test]
    fn records_without_url_are_dropped() {
        let mut store = DedupStore::new(base());
        assert!(!store.insert(draft("no link", None)));
        assert!(!store.insert(draft("blank link", Some(""))));
        assert!(store.insert(draft("kept", Some("/k.html"))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn output_never_longer_than_input() {
        let input: Vec<ProductDraft> = (0..20)
            .map(|i| draft("x", Some(&format!("/p/{}", i % 7))))
            .collect();
        let products = dedup_products(input, &base());
        assert_eq!(products.len(), 7);
        let unique: HashSet<&str> = products.iter().map(|p| p.product_url.as_str()).collect();
        assert_eq!(unique.len(), products.len());
    }

    #[test]
    fn empty_input_gives_empty_store() {
        let store = DedupStore::new(base());
        assert!(store.is_empty());
        assert!(store.into_products().is_empty());
    }
}
