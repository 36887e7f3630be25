//! Core library for receipt OCR processing.
//!
//! This crate provides:
//! - PDF page splitting and rasterizing for OCR
//! - A `TextRecognizer` seam with remote-service and local ONNX engines
//! - The text extraction adapter (file bytes + MIME type to raw text)
//! - Receipt field extraction (totals, GST/PST/HST, vendor, date, line items)

pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod receipt;

pub use error::{ExtractionError, OcrError, PdfError, RcptError, Result};
pub use extract::{MimeType, TextExtractor};
pub use models::config::RcptConfig;
pub use models::receipt::{FinancialFields, LineItem, ParsedReceipt, NOT_AVAILABLE};
pub use ocr::TextRecognizer;
#[cfg(feature = "native")]
pub use ocr::{LocalOcrEngine, RemoteOcrClient, create_recognizer};
pub use pdf::{PdfProcessor, PdfRasterizer};
pub use pipeline::ReceiptPipeline;
pub use receipt::{ExtractionResult, RawDocument, ReceiptParser, RuleReceiptParser};
