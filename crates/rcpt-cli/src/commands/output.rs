//! Output formatting shared by the processing commands.

use rcpt_core::{ExtractionResult, ParsedReceipt};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension used when writing this format to a directory.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// JSON carries the whole result (receipt, raw text, warnings, timing).
/// CSV and text describe the receipt only.
pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(&result.receipt),
        OutputFormat::Text => Ok(format_text(&result.receipt)),
    }
}

/// One row per line item, with the receipt fields repeated on every row.
/// A receipt without items still gets a single row.
fn format_csv(receipt: &ParsedReceipt) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "vendor",
        "date",
        "total_amount",
        "gst_amount",
        "pst_amount",
        "hst_amount",
        "item_description",
        "item_price",
    ])?;

    let financials = &receipt.financials;
    let fields = [
        receipt.vendor.clone(),
        receipt.date.clone(),
        financials.total_amount.to_string(),
        financials.gst_amount.to_string(),
        financials.pst_amount.to_string(),
        financials.hst_amount.to_string(),
    ];

    if receipt.line_items.is_empty() {
        wtr.write_record(fields.iter().map(String::as_str).chain(["", ""]))?;
    }

    for item in &receipt.line_items {
        let price = item.price.to_string();
        wtr.write_record(
            fields
                .iter()
                .map(String::as_str)
                .chain([item.description.as_str(), price.as_str()]),
        )?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(receipt: &ParsedReceipt) -> String {
    let mut output = String::new();

    output.push_str(&format!("Vendor: {}\n", receipt.vendor));
    output.push_str(&format!("Date: {}", receipt.date));
    match receipt.normalized_date() {
        Some(date) if date.to_string() != receipt.date => {
            output.push_str(&format!(" ({})\n", date))
        }
        _ => output.push('\n'),
    }
    output.push('\n');

    if !receipt.line_items.is_empty() {
        output.push_str("Items:\n");
        for item in &receipt.line_items {
            output.push_str(&format!("  {:<40} {:>10}\n", item.description, item.price));
        }
        output.push('\n');
    }

    let financials = &receipt.financials;
    output.push_str("Summary:\n");
    for (label, amount) in [
        ("GST", financials.gst_amount),
        ("PST", financials.pst_amount),
        ("HST", financials.hst_amount),
    ] {
        if !amount.is_zero() {
            output.push_str(&format!("  {}:   {}\n", label, amount));
        }
    }
    output.push_str(&format!("  Total: {}\n", financials.total_amount));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcpt_core::{LineItem, ParsedReceipt};

    fn wrap(receipt: ParsedReceipt) -> ExtractionResult {
        ExtractionResult {
            receipt,
            raw_text: "CORNER CAFE\nLatte 4.50".to_string(),
            warnings: vec!["Missing date".to_string()],
            processing_time_ms: 3,
        }
    }

    fn sample() -> ParsedReceipt {
        let mut receipt = ParsedReceipt::new();
        receipt.vendor = "CORNER CAFE".to_string();
        receipt.date = "2024-01-15".to_string();
        receipt.financials.total_amount = "5.25".parse().unwrap();
        receipt.financials.gst_amount = "0.25".parse().unwrap();
        receipt.line_items = vec![
            LineItem::new("Latte", "4.50".parse().unwrap()),
            LineItem::new("Cookie, oat", "0.50".parse().unwrap()),
        ];
        receipt
    }

    #[test]
    fn test_csv_row_per_item() {
        let csv = format_result(&wrap(sample()), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "CORNER CAFE,2024-01-15,5.25,0.25,0,0,Latte,4.50");
        assert!(lines[2].ends_with("\"Cookie, oat\",0.50"));
    }

    #[test]
    fn test_json_keeps_raw_text_and_warnings() {
        let json = format_result(&wrap(sample()), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["receipt"]["vendor"], "CORNER CAFE");
        assert_eq!(value["raw_text"], "CORNER CAFE\nLatte 4.50");
        assert_eq!(value["warnings"][0], "Missing date");
        assert_eq!(value["processing_time_ms"], 3);
    }

    #[test]
    fn test_csv_without_items() {
        let csv = format_result(&wrap(ParsedReceipt::new()), OutputFormat::Csv).unwrap();
        assert_eq!(csv.lines().nth(1), Some("N/A,N/A,0,0,0,0,,"));
    }

    #[test]
    fn test_text_shows_normalized_date() {
        let mut receipt = sample();
        receipt.date = "15/01/24".to_string();
        let text = format_result(&wrap(receipt), OutputFormat::Text).unwrap();
        assert!(text.contains("Date: 15/01/24 (2024-01-15)"));
    }

    #[test]
    fn test_text_skips_zero_taxes() {
        let text = format_result(&wrap(sample()), OutputFormat::Text).unwrap();
        assert!(text.contains("Vendor: CORNER CAFE"));
        assert!(text.contains("Date: 2024-01-15\n"));
        assert!(text.contains("GST:   0.25"));
        assert!(!text.contains("PST"));
        assert!(text.contains("Total: 5.25"));
    }
}
