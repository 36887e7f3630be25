//! Configuration structures for the receipt pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the rcpt pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Receipt parser configuration.
    pub parser: ParserConfig,
}

/// Which OCR engine to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// Hosted text recognition service.
    #[default]
    Remote,
    /// Local ONNX models via pure-onnx-ocr.
    Local,
}

/// OCR engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Engine backend.
    pub backend: OcrBackend,

    /// Annotate endpoint of the remote service.
    pub endpoint: String,

    /// Environment variable holding the remote service API key.
    pub api_key_env: String,

    /// HTTP timeout for the remote service, in seconds. No timeout if unset.
    pub timeout_secs: Option<u64>,

    /// Directory with `det.onnx`, `latin_rec.onnx` and `latin_dict.txt` for the local engine.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens emitted by the local recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Remote,
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key_env: "RCPT_OCR_API_KEY".to_string(),
            timeout_secs: None,
            model_dir: PathBuf::from("models"),
            keep_unk: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rasterizing PDF pages before OCR.
    pub render_dpi: u32,

    /// Render pages through the Pdfium library when it can be loaded.
    /// Pages otherwise come from their embedded scan images.
    pub use_pdfium: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            use_pdfium: true,
        }
    }
}

/// Receipt parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Number of leading lines searched for the vendor name.
    pub vendor_scan_lines: usize,

    /// Vendor candidates must be longer than this many characters.
    pub vendor_min_length: usize,

    /// Lines containing any of these (case-insensitive) are never the vendor.
    pub vendor_excluded_keywords: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            vendor_scan_lines: 5,
            vendor_min_length: 3,
            vendor_excluded_keywords: ["invoice", "facture", "date", "caissier"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
