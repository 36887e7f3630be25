//! WASM bindings for receipt parsing.
//!
//! Text recognition happens in the browser (or any other engine); these
//! bindings turn the recognized text into structured receipt data.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use rcpt_core::models::config::ParserConfig;
use rcpt_core::receipt::rules::parse_amount as parse_decimal_amount;
use rcpt_core::{ReceiptParser, RuleReceiptParser};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Flattened receipt fields serialize as a map, so plain objects are requested
/// instead of JS `Map`s.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract receipt data from recognized text using default settings.
#[wasm_bindgen]
pub fn parse_receipt_text(text: &str) -> Result<JsValue, JsValue> {
    let parser = RuleReceiptParser::new();
    to_js(&parser.parse(text).receipt)
}

/// Parse an amount such as "$12.34" or "12,34".
#[wasm_bindgen]
pub fn parse_amount(amount: &str) -> Option<f64> {
    parse_decimal_amount(amount).and_then(|d| d.to_string().parse().ok())
}

/// Receipt extractor class for browser use.
#[wasm_bindgen]
pub struct ReceiptExtractor {
    parser: RuleReceiptParser,
}

#[wasm_bindgen]
impl ReceiptExtractor {
    /// Create a new receipt extractor.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            parser: RuleReceiptParser::new(),
        }
    }

    /// Create an extractor from a JSON parser configuration.
    ///
    /// Missing keys take their default values.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str) -> Result<ReceiptExtractor, JsValue> {
        let config: ParserConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid parser config: {}", e)))?;

        Ok(Self {
            parser: RuleReceiptParser::from_config(config),
        })
    }

    /// Extract receipt from text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse(text).receipt)
    }

    /// Get extraction result with raw text, warnings and timing.
    #[wasm_bindgen]
    pub fn extract_with_metadata(&self, text: &str) -> Result<JsValue, JsValue> {
        let result = self.parser.parse(text);

        for warning in &result.warnings {
            web_sys::console::debug_1(&JsValue::from_str(warning));
        }

        to_js(&result)
    }
}

impl Default for ReceiptExtractor {
    fn default() -> Self {
        Self::new()
    }
}
