//! Line item reconstruction.
//!
//! Receipts print an item either as one line ending in its price, or as one or
//! more description lines followed by a line holding only the price. A small
//! state machine covers both layouts:
//!
//! - `Empty` + bare price: price is dropped
//! - `Accumulating` + bare price: emit the joined description, back to `Empty`
//! - any state + description with price: emit pending fragments plus this
//!   description, back to `Empty`
//! - any state + text longer than one character: append it, `Accumulating`

use rust_decimal::Decimal;

use super::amounts::parse_amount;
use super::patterns::{BARE_PRICE, DESCRIPTION_PRICE};
use crate::models::receipt::LineItem;

/// How a single line reads to the item reconstructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineShape<'a> {
    /// Nothing but a price.
    BarePrice(Decimal),
    /// Description text ending in a price.
    DescriptionPrice(&'a str, Decimal),
    /// No price on the line.
    Text,
}

impl<'a> LineShape<'a> {
    pub fn of(line: &'a str) -> Self {
        if let Some(price) = BARE_PRICE
            .captures(line)
            .and_then(|caps| parse_amount(&caps[1]))
        {
            return LineShape::BarePrice(price);
        }

        if let Some(caps) = DESCRIPTION_PRICE.captures(line) {
            let description = caps.get(1).map_or("", |m| m.as_str()).trim();
            if let Some(price) = parse_amount(&caps[2]) {
                return LineShape::DescriptionPrice(description, price);
            }
        }

        LineShape::Text
    }
}

/// Pending description fragments between emitted items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ItemAccumulator {
    #[default]
    Empty,
    Accumulating(Vec<String>),
}

impl ItemAccumulator {
    /// Feed one line, returning the next state and any completed item.
    pub fn step(self, line: &str) -> (Self, Option<LineItem>) {
        match LineShape::of(line) {
            LineShape::BarePrice(price) => match self {
                ItemAccumulator::Empty => (ItemAccumulator::Empty, None),
                ItemAccumulator::Accumulating(fragments) => (
                    ItemAccumulator::Empty,
                    Some(LineItem::new(fragments.join(" "), price)),
                ),
            },
            LineShape::DescriptionPrice(description, price) => {
                let mut fragments = self.into_fragments();
                fragments.push(description.to_string());
                (
                    ItemAccumulator::Empty,
                    Some(LineItem::new(fragments.join(" "), price)),
                )
            }
            LineShape::Text if line.chars().count() > 1 => (self.append(line), None),
            LineShape::Text => (self, None),
        }
    }

    fn append(self, line: &str) -> Self {
        let mut fragments = self.into_fragments();
        fragments.push(line.to_string());
        ItemAccumulator::Accumulating(fragments)
    }

    fn into_fragments(self) -> Vec<String> {
        match self {
            ItemAccumulator::Empty => Vec::new(),
            ItemAccumulator::Accumulating(fragments) => fragments,
        }
    }
}

/// Rebuild line items from a sequence of (unclaimed) lines.
pub fn reconstruct_line_items<'a, I>(lines: I) -> Vec<LineItem>
where
    I: IntoIterator<Item = &'a str>,
{
    let (_, items) = lines.into_iter().fold(
        (ItemAccumulator::Empty, Vec::new()),
        |(state, mut items), line| {
            let (next, item) = state.step(line);
            items.extend(item);
            (next, items)
        },
    );
    items
}
