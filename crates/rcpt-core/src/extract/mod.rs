//! Text extraction: uploaded file bytes to one raw text document.

use std::fmt;
use std::io::Cursor;

use tracing::{debug, info, warn};

use crate::error::{ExtractionError, PdfError};
use crate::models::config::PdfConfig;
use crate::ocr::TextRecognizer;
use crate::pdf::{PdfProcessor, PdfRasterizer};

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// File types accepted for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeType {
    Png,
    Jpeg,
    Pdf,
}

impl MimeType {
    /// Parse a declared MIME type, ignoring case and parameters.
    pub fn parse(mime: &str) -> Result<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();

        match essence.as_str() {
            "image/png" => Ok(MimeType::Png),
            "image/jpeg" | "image/jpg" => Ok(MimeType::Jpeg),
            "application/pdf" => Ok(MimeType::Pdf),
            _ => Err(ExtractionError::UnsupportedFileType(mime.to_string())),
        }
    }

    /// Guess the MIME type from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(MimeType::Png),
            "jpg" | "jpeg" => Some(MimeType::Jpeg),
            "pdf" => Some(MimeType::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Png => "image/png",
            MimeType::Jpeg => "image/jpeg",
            MimeType::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns uploaded files into text using an injected OCR engine.
pub struct TextExtractor<R> {
    recognizer: R,
    render_dpi: u32,
    use_pdfium: bool,
}

impl<R: TextRecognizer> TextExtractor<R> {
    /// Create an extractor around an engine handle owned by the caller.
    pub fn new(recognizer: R) -> Self {
        let defaults = PdfConfig::default();
        Self {
            recognizer,
            render_dpi: defaults.render_dpi,
            use_pdfium: defaults.use_pdfium,
        }
    }

    /// Create an extractor using PDF settings from configuration.
    pub fn with_config(recognizer: R, config: &PdfConfig) -> Self {
        Self::new(recognizer)
            .with_render_dpi(config.render_dpi)
            .with_pdfium(config.use_pdfium)
    }

    /// Set the DPI PDF pages are rasterized at.
    pub fn with_render_dpi(mut self, dpi: u32) -> Self {
        self.render_dpi = dpi;
        self
    }

    /// Choose whether PDF pages may be rendered through Pdfium.
    pub fn with_pdfium(mut self, enabled: bool) -> Self {
        self.use_pdfium = enabled;
        self
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Extract the text of a file with a declared MIME type.
    pub fn extract(&self, data: &[u8], mime: &str) -> Result<String> {
        self.extract_typed(data, MimeType::parse(mime)?)
    }

    /// Extract the text of a file whose type is already known.
    pub fn extract_typed(&self, data: &[u8], mime: MimeType) -> Result<String> {
        info!(
            "Extracting text from {} bytes of {} with {}",
            data.len(),
            mime,
            self.recognizer.name()
        );

        match mime {
            MimeType::Png | MimeType::Jpeg => self
                .recognizer
                .recognize(data)
                .map_err(|e| ExtractionError::engine(None, e)),
            MimeType::Pdf => self.extract_pdf(data),
        }
    }

    /// OCR every page in order. The first failing page aborts the whole document.
    fn extract_pdf(&self, data: &[u8]) -> Result<String> {
        let mut rasterizer = PdfRasterizer::new().with_pdfium(self.use_pdfium);
        rasterizer.load(data)?;

        let page_count = rasterizer.page_count();
        let mut document = String::new();

        for page in 1..=page_count {
            let image = rasterizer.render_page(page, self.render_dpi)?;

            let mut png = Vec::new();
            image
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .map_err(|e| PdfError::Render {
                    page,
                    reason: e.to_string(),
                })?;

            debug!("Page {}/{}: {} byte PNG", page, page_count, png.len());

            let text = self.recognizer.recognize(&png).map_err(|e| {
                warn!("OCR failed on page {}: {}", page, e);
                ExtractionError::engine(Some(page), e)
            })?;

            document.push_str(&text);
            document.push('\n');
        }

        info!(
            "Extracted {} characters from {} pages",
            document.len(),
            page_count
        );

        Ok(document)
    }
}
