//! Publication date parsing.

use chrono::NaiveDate;
use tracing::warn;

/// Listing dates look like "03 Feb 2025".
pub const LISTING_DATE_FORMAT: &str = "%d %b %Y";

/// Parse a listing date, returning `None` (and logging) for anything that
/// does not match [`LISTING_DATE_FORMAT`] after trimming.
pub fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    // chrono lets a format space match no whitespace at all ("03Feb2025")
    if trimmed.split_whitespace().count() != 3 {
        warn!(raw = %text, "Failed to parse date '{}': expected day, month and year", trimmed);
        return None;
    }
    match NaiveDate::parse_from_str(trimmed, LISTING_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(raw = %text, "Failed to parse date '{}': {}", trimmed, e);
            None
        }
    }
}
