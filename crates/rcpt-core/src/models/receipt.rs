//! Structured expense data extracted from a receipt.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder used for text fields that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

lazy_static! {
    static ref YMD_PARTS: Regex = Regex::new(r"^(\d{4})[-/ ](\d{1,2})[-/ ](\d{1,2})$").unwrap();
    static ref DMY_PARTS: Regex = Regex::new(r"^(\d{1,2})[-/ ](\d{1,2})[-/ ](\d{2,4})$").unwrap();
}

/// A fully parsed receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReceipt {
    /// Merchant name, `"N/A"` when not found.
    pub vendor: String,

    /// Date exactly as printed, `"N/A"` when not found.
    pub date: String,

    /// Totals and tax amounts.
    #[serde(flatten)]
    pub financials: FinancialFields,

    /// Purchased items in order of appearance.
    pub line_items: Vec<LineItem>,
}

/// Total and tax amounts of a receipt. Missing amounts are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialFields {
    /// Amount paid.
    pub total_amount: Decimal,

    /// Goods and Services Tax (TPS).
    pub gst_amount: Decimal,

    /// Provincial Sales Tax (QST).
    pub pst_amount: Decimal,

    /// Harmonized Sales Tax (TVH).
    pub hst_amount: Decimal,
}

impl FinancialFields {
    /// Sum of all tax amounts.
    pub fn total_tax(&self) -> Decimal {
        self.gst_amount + self.pst_amount + self.hst_amount
    }
}

/// A single purchased item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description, possibly joined from several source lines.
    pub description: String,

    /// Item price.
    pub price: Decimal,
}

impl LineItem {
    pub fn new(description: impl Into<String>, price: Decimal) -> Self {
        Self {
            description: description.into(),
            price,
        }
    }
}

impl ParsedReceipt {
    /// Create a receipt with every field at its default.
    pub fn new() -> Self {
        Self {
            vendor: NOT_AVAILABLE.to_string(),
            date: NOT_AVAILABLE.to_string(),
            financials: FinancialFields::default(),
            line_items: Vec::new(),
        }
    }

    pub fn has_vendor(&self) -> bool {
        self.vendor != NOT_AVAILABLE
    }

    pub fn has_date(&self) -> bool {
        self.date != NOT_AVAILABLE
    }

    /// Sum of all line item prices.
    pub fn line_items_total(&self) -> Decimal {
        self.line_items.iter().map(|i| i.price).sum()
    }

    /// Interpret the raw date string as a calendar date.
    ///
    /// Accepts `YYYY-M-D` and `D-M-YY[YY]` with `-`, `/` or space separators.
    /// Two-digit years map 00-50 to 20xx and 51-99 to 19xx.
    pub fn normalized_date(&self) -> Option<NaiveDate> {
        let raw = self.date.trim();

        if let Some(caps) = YMD_PARTS.captures(raw) {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }

        if let Some(caps) = DMY_PARTS.captures(raw) {
            let day: u32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let year = parse_year(&caps[3])?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }

        None
    }

    /// Check the receipt for issues a reviewer should look at.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.has_vendor() {
            issues.push("Missing vendor".to_string());
        }

        if !self.has_date() {
            issues.push("Missing date".to_string());
        } else if self.normalized_date().is_none() {
            issues.push(format!("Date '{}' is not a valid calendar date", self.date));
        }

        if self.financials.total_amount.is_zero() {
            issues.push("Total amount is zero".to_string());
        }

        if !self.line_items.is_empty() && !self.financials.total_amount.is_zero() {
            let items = self.line_items_total();
            let with_tax = items + self.financials.total_tax();
            let tolerance = Decimal::new(1, 2);

            if (items - self.financials.total_amount).abs() > tolerance
                && (with_tax - self.financials.total_amount).abs() > tolerance
            {
                issues.push(format!(
                    "Line item total ({}) does not match receipt total ({})",
                    items, self.financials.total_amount
                ));
            }
        }

        issues
    }
}

impl Default for ParsedReceipt {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        2 if year <= 50 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
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
    fn test_defaults() {
        let receipt = ParsedReceipt::default();
        assert_eq!(receipt.vendor, "N/A");
        assert_eq!(receipt.date, "N/A");
        assert!(receipt.financials.total_amount.is_zero());
        assert!(receipt.line_items.is_empty());
    }

    #[test]
    fn test_normalized_date() {
        let mut receipt = ParsedReceipt::new();

        receipt.date = "2024-01-15".to_string();
        assert_eq!(receipt.normalized_date(), NaiveDate::from_ymd_opt(2024, 1, 15));

        receipt.date = "15/01/24".to_string();
        assert_eq!(receipt.normalized_date(), NaiveDate::from_ymd_opt(2024, 1, 15));

        receipt.date = "3 7 1999".to_string();
        assert_eq!(receipt.normalized_date(), NaiveDate::from_ymd_opt(1999, 7, 3));

        receipt.date = "31/02/2024".to_string();
        assert_eq!(receipt.normalized_date(), None);

        receipt.date = "N/A".to_string();
        assert_eq!(receipt.normalized_date(), None);
    }

    #[test]
    fn test_validate_accepts_total_with_tax() {
        let receipt = ParsedReceipt {
            vendor: "ACME HARDWARE".to_string(),
            date: "2024-03-02".to_string(),
            financials: FinancialFields {
                total_amount: dec("21.00"),
                gst_amount: dec("1.00"),
                ..Default::default()
            },
            line_items: vec![LineItem::new("Hammer", dec("20.00"))],
        };

        assert!(receipt.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_issues() {
        let mut receipt = ParsedReceipt::new();
        receipt.financials.total_amount = dec("50.00");
        receipt.line_items.push(LineItem::new("Hammer", dec("20.00")));

        let issues = receipt.validate();
        assert!(issues.contains(&"Missing vendor".to_string()));
        assert!(issues.contains(&"Missing date".to_string()));
        assert!(issues.iter().any(|i| i.starts_with("Line item total")));
    }

    #[test]
    fn test_serializes_flat_financials() {
        let receipt = ParsedReceipt::new();
        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("total_amount").is_some());
        assert!(json.get("financials").is_none());
    }
}
