//! Rule-based field extractors for receipts.

pub mod amounts;
pub mod dates;
pub mod line_items;
pub mod patterns;
pub mod summary;
pub mod vendor;

pub use amounts::{amounts_in, largest_amount, parse_amount};
pub use dates::extract_date;
pub use line_items::{reconstruct_line_items, ItemAccumulator, LineShape};
pub use summary::{FinancialSummary, LineMatch, SummaryCategory};
pub use vendor::{extract_vendor, is_upper_case};
