//! Common regex patterns for receipt extraction.
//!
//! Amounts always carry exactly two fraction digits and may use `.` or `,` as
//! the decimal separator.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Any amount, anywhere in the text
    pub static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"\d+[.,]\d{2}"
    ).unwrap();

    // Summary lines: keyword, optional colon/space, optional currency, amount.
    // TOTAL also fires on "subtotal"; callers reject matches preceded by "sub"/"sous-".
    pub static ref TOTAL: Regex = Regex::new(
        r"(?i)total[:\s]*[$€£]?\s*(\d+[.,]\d{2})"
    ).unwrap();

    pub static ref GST: Regex = Regex::new(
        r"(?i)(?:gst|tps)[:\s]*[$€£]?\s*(\d+[.,]\d{2})"
    ).unwrap();

    pub static ref PST: Regex = Regex::new(
        r"(?i)(?:pst|qst)[:\s]*[$€£]?\s*(\d+[.,]\d{2})"
    ).unwrap();

    pub static ref HST: Regex = Regex::new(
        r"(?i)(?:hst|tvh)[:\s]*[$€£]?\s*(\d+[.,]\d{2})"
    ).unwrap();

    pub static ref SUBTOTAL: Regex = Regex::new(
        r"(?i)(?:sub[\s-]?total|sous-total)[:\s]*[$€£]?\s*(\d+[.,]\d{2})"
    ).unwrap();

    // Line shapes for item reconstruction
    pub static ref BARE_PRICE: Regex = Regex::new(
        r"^[$€£]?\s*(\d+[.,]\d{2})\s*[$€£]?$"
    ).unwrap();

    pub static ref DESCRIPTION_PRICE: Regex = Regex::new(
        r"^(.+)(?:\s+|\s*[$€£]\s*)(\d+[.,]\d{2})\s*[$€£]?$"
    ).unwrap();

    // YYYY-M-D or D-M-YY[YY], separated by '-', '/' or a space. Unanchored so
    // timestamps and OCR-merged tokens still yield their date.
    pub static ref DATE: Regex = Regex::new(
        r"\d{4}[-/ ]\d{1,2}[-/ ]\d{1,2}|\d{1,2}[-/ ]\d{1,2}[-/ ]\d{2,4}"
    ).unwrap();
}
