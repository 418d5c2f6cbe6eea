//! Dotted-numeric version ordering.
//!
//! Version strings are compared by numeric precedence per component
//! (`"10.0"` sorts above `"9.1"`), with plain lexical string order as the
//! fallback when either side fails to parse. Exact-version resolution in
//! the registry is byte-for-byte string equality and never goes through
//! this module.

use std::cmp::Ordering;

/// Parse a dotted-numeric version string into its components.
///
/// Returns `None` if any component is empty or non-numeric (`"1.0.0"` →
/// `Some([1, 0, 0])`, `"1.0-beta"` → `None`).
pub fn parse_numeric(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .map(|component| component.parse::<u64>().ok())
        .collect()
}

/// Compare two version strings: numeric when both parse, lexical otherwise.
///
/// Numeric comparison is component-wise, so `"1.0"` orders strictly below
/// `"1.0.0"`.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_numeric(a), parse_numeric(b)) {
        (Some(a_parts), Some(b_parts)) => a_parts.cmp(&b_parts),
        _ => a.cmp(b),
    }
}
