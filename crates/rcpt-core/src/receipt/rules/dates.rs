//! Date extraction.
//!
//! Dates are kept exactly as printed; interpretation happens downstream.

use super::patterns::DATE;

/// First date-looking substring of the text.
pub fn extract_date(text: &str) -> Option<String> {
    DATE.find(text).map(|m| m.as_str().to_string())
}
