use std::sync::LazyLock;

use regex::Regex;

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([\d,]+(?:\.\d{2})?)").expect("valid regex"));

/// Prices read from one listing's text.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceQuote {
    pub current: Option<f64>,
    pub original: Option<f64>,
}

/// Parse every `$`-prefixed amount in `text`.
///
/// One amount is the current price. With two or more, the first is taken as
/// the original (pre-discount) price and the last as the current price; this
/// follows the usual strike-through-then-sale markup order and is a
/// heuristic.
#[must_use]
pub fn parse_prices(text: &str) -> PriceQuote {
    let amounts: Vec<f64> = PRICE_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .collect();

    match amounts.as_slice() {
        [] => PriceQuote::default(),
        [only] => PriceQuote {
            current: Some(*only),
            original: None,
        },
        [first, .., last] => PriceQuote {
            current: Some(*last),
            original: Some(*first),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_currency_yields_nothing() {
        assert_eq!(parse_prices("Sold out"), PriceQuote::default());
        assert_eq!(parse_prices(""), PriceQuote::default());
    }

    #[test]
    fn single_amount_is_current() {
        let quote = parse_prices("$49.99");
        assert_eq!(quote.current, Some(49.99));
        assert_eq!(quote.original, None);
    }

    #[test]
    fn two_amounts_are_original_then_current() {
        let quote = parse_prices("$129.99 $79.99");
        assert_eq!(quote.original, Some(129.99));
        assert_eq!(quote.current, Some(79.99));
    }

    #[test]
    fn three_amounts_use_first_and_last() {
        let quote = parse_prices("Was $200.00 Now $150.00 Save $50.00");
        assert_eq!(quote.original, Some(200.0));
        assert_eq!(quote.current, Some(50.0));
    }

    #[test]
    fn every_thousands_separator_is_stripped() {
        let quote = parse_prices("$1,299.99");
        assert_eq!(quote.current, Some(1299.99));
        let quote = parse_prices("$1,234,567");
        assert_eq!(quote.current, Some(1_234_567.0));
    }

    #[test]
    fn whole_dollar_amounts_parse() {
        assert_eq!(parse_prices("Only $30 today").current, Some(30.0));
    }

    #[test]
    fn amounts_embedded_in_tile_text() {
        let quote = parse_prices("Arc'teryx\nBeta Jacket\nReg. $650.00\nSale $454.99\nClearance");
        assert_eq!(quote.original, Some(650.0));
        assert_eq!(quote.current, Some(454.99));
    }

    #[test]
    fn bare_separator_after_dollar_is_ignored() {
        let quote = parse_prices("$, then $12.50");
        assert_eq!(quote.current, Some(12.5));
        assert_eq!(quote.original, None);
    }
}
