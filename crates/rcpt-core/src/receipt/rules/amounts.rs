//! Amount extraction.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::AMOUNT_PATTERN;

/// Parse an amount such as `$12.34`, `12,34` or `€ 5.00`.
///
/// Currency symbols and spaces are dropped and a `,` decimal separator becomes `.`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let normalized: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    Decimal::from_str(&normalized).ok()
}

/// Every two-decimal amount in the text, in order of appearance.
pub fn amounts_in(text: &str) -> impl Iterator<Item = Decimal> + '_ {
    AMOUNT_PATTERN
        .find_iter(text)
        .filter_map(|m| parse_amount(m.as_str()))
}

/// The largest amount appearing anywhere in the text.
pub fn largest_amount(text: &str) -> Option<Decimal> {
    amounts_in(text).max()
}
