//! Permissive parsing of user-entered numeric text.
//!
//! Bad input in a numeric field is never an error: it is normalised to
//! "unset" (or zero for rate fields) and logged.

use rust_decimal::Decimal;

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses an amount field.
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`). Returns `None`
/// for empty input, or when parsing fails (logs a warning on parse failure).
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return None;
    }
    normalized.parse().map_or_else(
        |e| {
            tracing::warn!(input = %s, "non-numeric amount treated as unset: {}", e);
            None
        },
        Some,
    )
}

/// Parses a rate field, treating empty, non-numeric or negative input as
/// zero.
///
/// A trailing `%` is accepted (`"4.0%"`). A zero rate unsets the tier's
/// payout and a zero developers rate does the same, so garbage never
/// produces a number.
pub fn parse_rate(s: &str) -> Decimal {
    let rate = parse_amount(s.trim().trim_end_matches('%')).unwrap_or(Decimal::ZERO);
    if rate < Decimal::ZERO {
        tracing::warn!(input = %s, "negative rate treated as zero");
        return Decimal::ZERO;
    }
    rate
}
