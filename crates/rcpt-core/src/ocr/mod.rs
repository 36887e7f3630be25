//! OCR engines.
//!
//! The pipeline only needs one capability from an engine: turn the bytes of one
//! image into text. Engines are constructed once by the caller and handed to
//! [`TextExtractor`](crate::extract::TextExtractor) explicitly.

#[cfg(feature = "native")]
mod pure_engine;
#[cfg(feature = "native")]
mod remote;

#[cfg(feature = "native")]
pub use pure_engine::LocalOcrEngine;
#[cfg(feature = "native")]
pub use remote::RemoteOcrClient;

use crate::error::OcrError;

/// A text recognition engine.
pub trait TextRecognizer {
    /// Short engine identifier for logs and metadata.
    fn name(&self) -> &str;

    /// Recognize the text in one encoded image (PNG or JPEG).
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

/// Build the engine selected in the configuration.
#[cfg(feature = "native")]
pub fn create_recognizer(
    config: &crate::models::config::OcrConfig,
) -> Result<Box<dyn TextRecognizer>, OcrError> {
    use crate::models::config::OcrBackend;

    match config.backend {
        OcrBackend::Remote => Ok(Box::new(RemoteOcrClient::from_config(config)?)),
        OcrBackend::Local => Ok(Box::new(LocalOcrEngine::from_dir(
            &config.model_dir,
            config.clone(),
        )?)),
    }
}
