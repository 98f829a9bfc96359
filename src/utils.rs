//! Utility functions for log formatting, upstream date formatting, and URL building.

use chrono::NaiveDate;
use serde_json::Value;

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backing off to a char boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Format a calendar date the way the Article Search API expects (`YYYYMMDD`).
pub fn upstream_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Substitute a section name into a Top Stories URL template.
///
/// The section is percent-encoded so a stray `/` or `?` cannot change the
/// request path.
pub fn section_url(template: &str, section: &str) -> String {
    template.replace("{section}", &urlencoding::encode(section))
}

/// Read a string field from a JSON object, defaulting to `""`.
///
/// Absent keys, `null`, and non-string values all yield an empty string.
pub fn str_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
