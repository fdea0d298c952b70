//! Numeric cell cleaning.
//!
//! Scraped tables print turnover with thousands separators and use dashes for
//! "no trade". Garbage cells must never abort a batch, so every input maps to
//! a finite, non-negative number.

use serde::{Deserialize, Serialize};

/// Cell texts that mean "nothing traded".
const PLACEHOLDERS: &[&str] = &["-", "--", "\u{2013}", "\u{2014}", "na", "n/a", "nil"];

/// How a cell was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueOutcome {
    /// A number was read.
    Parsed,
    /// Empty cell or a no-trade placeholder.
    Placeholder,
    /// Anything else; mapped to zero.
    Unparseable,
}

/// Parse a cell into a turnover value. Never fails.
#[inline]
pub fn normalize(text: &str) -> f64 {
    normalize_with_outcome(text).0
}

/// Parse a cell and report how it was interpreted.
pub fn normalize_with_outcome(text: &str) -> (f64, ValueOutcome) {
    let trimmed = text.trim();
    if trimmed.is_empty() || is_placeholder(trimmed) {
        return (0.0, ValueOutcome::Placeholder);
    }

    let cleaned: String = trimmed.chars().filter(|&c| c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => (v, ValueOutcome::Parsed),
        _ => (0.0, ValueOutcome::Unparseable),
    }
}

fn is_placeholder(trimmed: &str) -> bool {
    PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p))
}
