//! End-to-end processing: file bytes to structured receipt.

use std::time::Instant;

use tracing::info;

use crate::error::ExtractionError;
use crate::extract::TextExtractor;
use crate::models::config::RcptConfig;
use crate::ocr::TextRecognizer;
use crate::receipt::{ExtractionResult, ReceiptParser, RuleReceiptParser};

/// Text extraction followed by receipt parsing.
pub struct ReceiptPipeline<R> {
    extractor: TextExtractor<R>,
    parser: RuleReceiptParser,
}

impl<R: TextRecognizer> ReceiptPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            extractor: TextExtractor::new(recognizer),
            parser: RuleReceiptParser::new(),
        }
    }

    pub fn from_config(recognizer: R, config: &RcptConfig) -> Self {
        Self {
            extractor: TextExtractor::with_config(recognizer, &config.pdf),
            parser: RuleReceiptParser::from_config(config.parser.clone()),
        }
    }

    pub fn extractor(&self) -> &TextExtractor<R> {
        &self.extractor
    }

    pub fn parser(&self) -> &RuleReceiptParser {
        &self.parser
    }

    /// Recognize and parse one file. Extraction failures are returned as is and
    /// the parser is not run.
    pub fn process(&self, data: &[u8], mime: &str) -> Result<ExtractionResult, ExtractionError> {
        let start = Instant::now();

        let text = self.extractor.extract(data, mime)?;
        let mut result = self.parser.parse(&text);
        result.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Processed {} file in {}ms ({} line items)",
            mime,
            result.processing_time_ms,
            result.receipt.line_items.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use rust_decimal::Decimal;
    use std::cell::Cell;

    struct FixedText {
        reply: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl FixedText {
        fn ok(text: &'static str) -> Self {
            Self { reply: Some(text), calls: Cell::new(0) }
        }

        fn failing() -> Self {
            Self { reply: None, calls: Cell::new(0) }
        }
    }

    impl TextRecognizer for FixedText {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
            self.calls.set(self.calls.get() + 1);
            self.reply
                .map(String::from)
                .ok_or_else(|| OcrError::Service("quota exceeded".into()))
        }
    }

    #[test]
    fn test_process_image() {
        let pipeline = ReceiptPipeline::new(FixedText::ok("CORNER CAFE\nLatte 4.50\nTotal: 4.50"));
        let result = pipeline.process(b"png bytes", "image/png").unwrap();

        assert_eq!(result.receipt.vendor, "CORNER CAFE");
        assert_eq!(result.receipt.financials.total_amount, Decimal::new(450, 2));
        assert_eq!(result.receipt.line_items.len(), 1);
        assert_eq!(result.raw_text, "CORNER CAFE\nLatte 4.50\nTotal: 4.50");
    }

    #[test]
    fn test_engine_failure_short_circuits() {
        let pipeline = ReceiptPipeline::new(FixedText::failing());
        let err = pipeline.process(b"jpeg bytes", "image/jpeg").unwrap_err();

        assert!(matches!(err, ExtractionError::Engine { page: None, .. }));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_unsupported_type() {
        let pipeline = ReceiptPipeline::new(FixedText::ok("ignored"));
        let err = pipeline.process(b"GIF89a", "image/gif").unwrap_err();

        assert!(matches!(err, ExtractionError::UnsupportedFileType(ref m) if m == "image/gif"));
        assert_eq!(pipeline.extractor().recognizer().calls.get(), 0);
    }

    #[test]
    fn test_from_config_applies_parser_settings() {
        let mut config = RcptConfig::default();
        config.parser.vendor_min_length = 20;

        let pipeline = ReceiptPipeline::from_config(FixedText::ok("CORNER CAFE\nTotal 1.00"), &config);
        let result = pipeline.process(b"png", "image/png").unwrap();

        assert!(!result.receipt.has_vendor());
        assert!(result.warnings.contains(&"Missing vendor".to_string()));
    }
}
