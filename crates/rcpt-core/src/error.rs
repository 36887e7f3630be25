//! Error types for the rcpt-core library.

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// Text extraction failed for an uploaded file.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR engine error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning an uploaded file into raw text.
///
/// Every variant is terminal for the file: no partial document is returned.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The declared MIME type is not an image or PDF we can read.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The OCR engine reported an error, optionally for a specific PDF page.
    #[error("OCR engine error{}: {message}", page_suffix(.page))]
    Engine {
        /// 1-based PDF page number, `None` for single images.
        page: Option<u32>,
        message: String,
    },

    /// The PDF could not be split into page images.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),
}

impl ExtractionError {
    /// Wrap an engine failure, tagging the page it happened on.
    pub fn engine(page: Option<u32>, err: impl std::fmt::Display) -> Self {
        Self::Engine {
            page,
            message: err.to_string(),
        }
    }
}

fn page_suffix(page: &Option<u32>) -> String {
    page.map(|p| format!(" on page {}", p)).unwrap_or_default()
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// The page carries no image that can be rasterized.
    #[error("no decodable image on page {0}")]
    NoPageImage(u32),

    /// Failed to produce the page raster.
    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },
}

/// Errors related to OCR engines.
#[derive(Error, Debug)]
pub enum OcrError {
    /// No API key available for the remote service.
    #[error("missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),

    /// Transport-level failure talking to the remote service.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with an error for this image.
    #[error("service error: {0}")]
    Service(String),

    /// The service response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
