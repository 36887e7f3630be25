//! Three-pass rule-based receipt parser.

use std::time::Instant;

use tracing::{debug, info};

use crate::models::config::ParserConfig;
use crate::models::receipt::ParsedReceipt;

use super::rules::{
    extract_date, extract_vendor, largest_amount, reconstruct_line_items, FinancialSummary,
};
use super::{ExtractionResult, RawDocument, ReceiptParser};

/// Receipt parser built on line-oriented pattern rules.
///
/// 1. Summary lines (total, taxes, subtotal) are claimed and their amounts kept.
/// 2. The remaining lines are folded into line items.
/// 3. Vendor and date are picked up, and a missing total falls back to the
///    largest amount in the text.
#[derive(Debug, Clone, Default)]
pub struct RuleReceiptParser {
    config: ParserConfig,
}

impl RuleReceiptParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn parse_inner(&self, document: &RawDocument) -> (ParsedReceipt, bool) {
        let lines = document.lines();
        let mut receipt = ParsedReceipt::new();

        let summary = FinancialSummary::scan(lines);
        receipt.financials = summary.fields();
        debug!(
            "Summary pass claimed {} of {} lines",
            summary.claimed.len(),
            lines.len()
        );

        receipt.line_items = reconstruct_line_items(
            lines
                .iter()
                .enumerate()
                .filter(|(index, _)| !summary.is_claimed(*index))
                .map(|(_, line)| line.as_str()),
        );
        debug!("Reconstructed {} line items", receipt.line_items.len());

        if let Some(vendor) = extract_vendor(lines, &self.config) {
            receipt.vendor = vendor;
        }

        if let Some(date) = extract_date(document.text()) {
            receipt.date = date;
        }

        let mut used_fallback = false;
        if receipt.financials.total_amount.is_zero() {
            if let Some(amount) = largest_amount(document.text()) {
                debug!("No labeled total, falling back to largest amount {}", amount);
                receipt.financials.total_amount = amount;
                used_fallback = true;
            }
        }

        (receipt, used_fallback)
    }
}

impl ReceiptParser for RuleReceiptParser {
    fn parse_document(&self, document: &RawDocument) -> ParsedReceipt {
        self.parse_inner(document).0
    }

    fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Parsing receipt from {} characters of text", text.len());

        let document = RawDocument::new(text);
        let (receipt, used_fallback) = self.parse_inner(&document);

        if used_fallback {
            warnings.push(format!(
                "Total not labeled; using largest amount in text ({})",
                receipt.financials.total_amount
            ));
        }

        if receipt.line_items.is_empty() {
            warnings.push("No line items found".to_string());
        }

        warnings.extend(receipt.validate());

        debug!(
            "Extracted receipt from {} with total {} and {} warnings",
            receipt.vendor,
            receipt.financials.total_amount,
            warnings.len()
        );

        ExtractionResult {
            receipt,
            raw_text: text.to_string(),
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::{LineItem, NOT_AVAILABLE};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn parse_lines(lines: &[&str]) -> ParsedReceipt {
        RuleReceiptParser::new().parse_document(&RawDocument::from_lines(lines))
    }

    #[test]
    fn test_empty_document() {
        let receipt = parse_lines(&[]);
        assert_eq!(receipt, ParsedReceipt::new());

        let result = RuleReceiptParser::new().parse("");
        assert!(result.warnings.contains(&"No line items found".to_string()));
        assert!(result.warnings.contains(&"Missing vendor".to_string()));
    }

    #[test]
    fn test_total_line_is_claimed() {
        let receipt = parse_lines(&["Pen", "Total: $12.34"]);
        assert_eq!(receipt.financials.total_amount, dec("12.34"));
        assert!(receipt.line_items.is_empty());
    }

    #[test]
    fn test_subtotal_claimed_without_value() {
        let receipt = parse_lines(&["Pen", "Sous-total: $10.00"]);
        // Subtotal sets nothing, so the total comes from the fallback.
        assert_eq!(receipt.financials.gst_amount, Decimal::ZERO);
        assert_eq!(receipt.financials.total_amount, dec("10.00"));
        assert!(receipt.line_items.is_empty());
    }

    #[test]
    fn test_description_then_price() {
        let receipt = parse_lines(&["Wireless Mouse", "$19.99"]);
        assert_eq!(
            receipt.line_items,
            vec![LineItem::new("Wireless Mouse", dec("19.99"))]
        );
    }

    #[test]
    fn test_inline_item() {
        let receipt = parse_lines(&["Keyboard Combo  $45.00"]);
        assert_eq!(
            receipt.line_items,
            vec![LineItem::new("Keyboard Combo", dec("45.00"))]
        );
    }

    #[test]
    fn test_leading_bare_price_dropped() {
        let receipt = parse_lines(&["$5.00", "Wireless Mouse", "$19.99"]);
        assert_eq!(
            receipt.line_items,
            vec![LineItem::new("Wireless Mouse", dec("19.99"))]
        );
    }

    #[test]
    fn test_total_fallback_uses_largest_amount() {
        let receipt = parse_lines(&["Coffee 4.99", "Sandwich 12.50", "Cookie 3.00"]);
        assert_eq!(receipt.financials.total_amount, dec("12.50"));

        let result = RuleReceiptParser::new().parse("Coffee 4.99\nSandwich 12.50\nCookie 3.00");
        assert_eq!(
            result.warnings[0],
            "Total not labeled; using largest amount in text (12.50)"
        );
    }

    #[test]
    fn test_no_amounts_keeps_zero_total() {
        let receipt = parse_lines(&["HELLO WORLD", "thanks"]);
        assert_eq!(receipt.financials.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_vendor_chosen_over_invoice_line() {
        let receipt = parse_lines(&["Invoice #1234", "ACME HARDWARE", "Hammer 20.00"]);
        assert_eq!(receipt.vendor, "ACME HARDWARE");
    }

    #[test]
    fn test_date_found_past_header() {
        let receipt = parse_lines(&[
            "Line one", "Line two", "Line three", "Line four", "Line five", "Line six",
            "Paid 15/01/2024",
        ]);
        assert_eq!(receipt.date, "15/01/2024");
        assert_eq!(receipt.vendor, NOT_AVAILABLE);
    }

    #[test]
    fn test_full_receipt() {
        let text = r#"
            ACME HARDWARE
            2024-01-15 10:32
            Hammer 20.00
            Wood Screws
            Box of 100
            $8.50
            Subtotal 28.50
            GST 1.43
            QST $2.84
            TOTAL: $32.77
            Thank you!
        "#;

        let result = RuleReceiptParser::new().parse(text);
        let receipt = &result.receipt;

        assert_eq!(receipt.vendor, "ACME HARDWARE");
        assert_eq!(receipt.date, "2024-01-15");
        assert_eq!(receipt.financials.total_amount, dec("32.77"));
        assert_eq!(receipt.financials.gst_amount, dec("1.43"));
        assert_eq!(receipt.financials.pst_amount, dec("2.84"));
        assert_eq!(receipt.financials.hst_amount, Decimal::ZERO);
        assert_eq!(
            receipt.line_items,
            vec![
                LineItem::new("ACME HARDWARE 2024-01-15 10:32 Hammer", dec("20.00")),
                LineItem::new("Wood Screws Box of 100", dec("8.50")),
            ]
        );
        assert_eq!(result.raw_text, text);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_line_item_mismatch_warning() {
        let result = RuleReceiptParser::new().parse("STORE ONE\n2024-02-01\nPen 1.00\nTotal 9.00");
        assert_eq!(
            result.warnings,
            vec!["Line item total (1.00) does not match receipt total (9.00)".to_string()]
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let document = RawDocument::new("ACME\nWireless Mouse\n$19.99\nTotal 19.99");
        let parser = RuleReceiptParser::new();
        assert_eq!(parser.parse_document(&document), parser.parse_document(&document));
    }

    #[test]
    fn test_custom_config() {
        let config = ParserConfig {
            vendor_excluded_keywords: vec!["acme".to_string()],
            ..Default::default()
        };
        let parser = RuleReceiptParser::from_config(config);
        let receipt = parser.parse_document(&RawDocument::new("ACME HARDWARE\nINVOICE STORE"));
        assert_eq!(receipt.vendor, "INVOICE STORE");
    }
}
