//! Number coercion for criteria comparands and projected cells.

use crate::config::DatabaseConfig;
use dquery_common::LiteralValue;

/// Parse text as a spreadsheet number: optional sign, digits, optional
/// fraction and exponent, surrounding whitespace allowed. Rejects the
/// `inf`/`nan` spellings Rust's float parser would otherwise accept.
pub fn parse_number_text(s: &str) -> Option<f64> {
    let t = s.trim();
    let first = t.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '+' | '-' | '.')) {
        return None;
    }
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    t.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// The value a numeric aggregator sees for `cell`, if any.
///
/// Number cells always count. Numeric text and booleans count only when the
/// config asks for it; blanks, other text and errors never do.
pub fn projected_number(cell: &LiteralValue, config: &DatabaseConfig) -> Option<f64> {
    match cell {
        LiteralValue::Number(n) => Some(*n),
        LiteralValue::Text(s) if config.coerce_numeric_text => parse_number_text(s),
        LiteralValue::Boolean(b) if config.booleans_as_numbers => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}
