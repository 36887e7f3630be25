//! Financial summary lines: total, GST, PST, HST and subtotal.

use std::collections::BTreeSet;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::trace;

use super::amounts::parse_amount;
use super::patterns::{GST, HST, PST, SUBTOTAL, TOTAL};
use crate::models::receipt::FinancialFields;

/// Kind of summary line, in the order lines are tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryCategory {
    Total,
    Gst,
    Pst,
    Hst,
    Subtotal,
}

impl SummaryCategory {
    /// Categories in match priority order.
    pub const PRIORITY: [SummaryCategory; 5] = [
        SummaryCategory::Total,
        SummaryCategory::Gst,
        SummaryCategory::Pst,
        SummaryCategory::Hst,
        SummaryCategory::Subtotal,
    ];

    fn pattern(&self) -> &'static Regex {
        match self {
            SummaryCategory::Total => &*TOTAL,
            SummaryCategory::Gst => &*GST,
            SummaryCategory::Pst => &*PST,
            SummaryCategory::Hst => &*HST,
            SummaryCategory::Subtotal => &*SUBTOTAL,
        }
    }

    /// Amount of this category on the line, if the line is one.
    pub fn match_line(&self, line: &str) -> Option<Decimal> {
        self.pattern()
            .captures_iter(line)
            .find(|caps| {
                let start = caps.get(0).map_or(0, |m| m.start());
                *self != SummaryCategory::Total || !follows_subtotal_prefix(line, start)
            })
            .and_then(|caps| parse_amount(&caps[1]))
    }
}

/// Whether the text right before `start` is "sub" or "sous-".
fn follows_subtotal_prefix(line: &str, start: usize) -> bool {
    let before = line[..start].to_lowercase();
    before.ends_with("sub") || before.ends_with("sous-")
}

/// First category (in priority order) that the line matches.
pub fn classify_line(line: &str) -> Option<(SummaryCategory, Decimal)> {
    SummaryCategory::PRIORITY
        .iter()
        .find_map(|category| category.match_line(line).map(|amount| (*category, amount)))
}

/// An amount together with the index of the line it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch {
    pub value: Decimal,
    pub line: usize,
}

/// Result of scanning a document for summary lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinancialSummary {
    pub total: Option<LineMatch>,
    pub gst: Option<LineMatch>,
    pub pst: Option<LineMatch>,
    pub hst: Option<LineMatch>,
    /// Lines recognized as summary lines, excluded from line items.
    pub claimed: BTreeSet<usize>,
}

impl FinancialSummary {
    /// Scan lines in order. The first match of each category wins.
    pub fn scan<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut summary = Self::default();

        for (index, line) in lines.iter().enumerate() {
            let Some((category, value)) = classify_line(line.as_ref()) else {
                continue;
            };

            trace!("Line {} is {:?} {}", index, category, value);
            summary.claimed.insert(index);

            let slot = match category {
                SummaryCategory::Total => &mut summary.total,
                SummaryCategory::Gst => &mut summary.gst,
                SummaryCategory::Pst => &mut summary.pst,
                SummaryCategory::Hst => &mut summary.hst,
                SummaryCategory::Subtotal => continue,
            };

            if slot.is_none() {
                *slot = Some(LineMatch { value, line: index });
            }
        }

        summary
    }

    pub fn is_claimed(&self, line: usize) -> bool {
        self.claimed.contains(&line)
    }

    /// Amounts found, zero where a category is absent.
    pub fn fields(&self) -> FinancialFields {
        let value = |m: &Option<LineMatch>| m.map(|m| m.value).unwrap_or(Decimal::ZERO);

        FinancialFields {
            total_amount: value(&self.total),
            gst_amount: value(&self.gst),
            pst_amount: value(&self.pst),
            hst_amount: value(&self.hst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_total_line() {
        assert_eq!(
            classify_line("Total: $12.34"),
            Some((SummaryCategory::Total, dec("12.34")))
        );
        assert_eq!(
            classify_line("TOTAL 8,50"),
            Some((SummaryCategory::Total, dec("8.50")))
        );
    }

    #[test]
    fn test_subtotal_is_not_total() {
        assert_eq!(
            classify_line("Sous-total: $10.00"),
            Some((SummaryCategory::Subtotal, dec("10.00")))
        );
        assert_eq!(
            classify_line("SUBTOTAL 10.00"),
            Some((SummaryCategory::Subtotal, dec("10.00")))
        );
    }

    #[test]
    fn test_tax_lines() {
        assert_eq!(classify_line("GST: 0.50"), Some((SummaryCategory::Gst, dec("0.50"))));
        assert_eq!(classify_line("TPS 0,50"), Some((SummaryCategory::Gst, dec("0.50"))));
        assert_eq!(classify_line("QST $1.00"), Some((SummaryCategory::Pst, dec("1.00"))));
        assert_eq!(classify_line("HST 1.30"), Some((SummaryCategory::Hst, dec("1.30"))));
        assert_eq!(classify_line("TVH: 1.30"), Some((SummaryCategory::Hst, dec("1.30"))));
    }

    #[test]
    fn test_priority_order() {
        // Both total and GST fit; total is tested first.
        assert_eq!(
            classify_line("GST 0.50 Total 10.50"),
            Some((SummaryCategory::Total, dec("10.50")))
        );
        // "Total GST" is not followed by an amount, so only GST fits.
        assert_eq!(
            classify_line("Total GST: 1.50"),
            Some((SummaryCategory::Gst, dec("1.50")))
        );
    }

    #[test]
    fn test_non_summary_lines() {
        assert_eq!(classify_line("Wireless Mouse"), None);
        assert_eq!(classify_line("$19.99"), None);
        assert_eq!(classify_line("GST 5% 0.50"), None);
    }

    #[test]
    fn test_scan_first_match_wins() {
        let lines = [
            "Hammer 20.00",
            "Subtotal 20.00",
            "GST 1.00",
            "Total: $21.00",
            "Total: $99.00",
        ];
        let summary = FinancialSummary::scan(&lines[..]);

        assert_eq!(summary.total, Some(LineMatch { value: dec("21.00"), line: 3 }));
        assert_eq!(summary.gst, Some(LineMatch { value: dec("1.00"), line: 2 }));
        assert_eq!(summary.pst, None);
        assert_eq!(summary.claimed.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert!(!summary.is_claimed(0));

        let fields = summary.fields();
        assert_eq!(fields.total_amount, dec("21.00"));
        assert_eq!(fields.hst_amount, Decimal::ZERO);
    }
}
