//! Receipt field extraction module.

mod parser;
pub mod rules;

pub use parser::RuleReceiptParser;

use serde::Serialize;

use crate::models::receipt::ParsedReceipt;

/// Recognized text split into trimmed, non-empty lines.
///
/// The original text is kept because date and fallback-total searches run
/// over the whole document, not line by line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    text: String,
    lines: Vec<String>,
}

impl RawDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        Self { text, lines }
    }

    /// Build a document from already-split lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(joined)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Result of receipt extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Extracted receipt data.
    pub receipt: ParsedReceipt,
    /// Raw recognized text.
    pub raw_text: String,
    /// Review warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for receipt parsing.
///
/// Parsing never fails: fields that cannot be found keep their defaults.
pub trait ReceiptParser {
    /// Parse a prepared document into a receipt.
    fn parse_document(&self, document: &RawDocument) -> ParsedReceipt;

    /// Parse recognized text, collecting review warnings.
    fn parse(&self, text: &str) -> ExtractionResult;
}
