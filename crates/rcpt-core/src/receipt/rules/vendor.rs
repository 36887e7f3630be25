//! Vendor name detection from the receipt header.

use crate::models::config::ParserConfig;

/// True when the text has cased characters and all of them are upper-case.
pub fn is_upper_case(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// First header line that looks like a store name.
///
/// Only the first `vendor_scan_lines` lines are considered. A candidate must be
/// longer than `vendor_min_length` characters, fully upper-case, and free of
/// the excluded keywords.
pub fn extract_vendor<S: AsRef<str>>(lines: &[S], config: &ParserConfig) -> Option<String> {
    let excluded: Vec<String> = config
        .vendor_excluded_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();

    lines
        .iter()
        .take(config.vendor_scan_lines)
        .map(|line| line.as_ref())
        .find(|line| {
            let lower = line.to_lowercase();
            line.chars().count() > config.vendor_min_length
                && is_upper_case(line)
                && !excluded.iter().any(|k| lower.contains(k.as_str()))
        })
        .map(|line| line.to_string())
}
