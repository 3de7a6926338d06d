//! Conversion and query facade over a rate table
//!
//! Applies resolved rates to amounts, lists what the table knows about, and
//! validates raw user input before it reaches the resolver.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::data::RateTable;
use crate::resolver::{exchange_rate, ResolveError};

/// Errors returned by conversions and input validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// The user supplied an unusable amount or currency code
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The currency pair cannot be priced
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Converts `amount` units of `from` into `to`
///
/// A negative or non-finite amount is rejected before any rate lookup.
pub fn convert(table: &RateTable, amount: f64, from: &str, to: &str) -> Result<f64, ConvertError> {
    let amount = validate_amount(amount)?;
    let rate = exchange_rate(table, from, to)?;
    Ok(amount * rate)
}

/// Checks that `amount` can be converted
pub fn validate_amount(amount: f64) -> Result<f64, ConvertError> {
    if !amount.is_finite() {
        return Err(ConvertError::InvalidInput(format!(
            "amount must be a finite number, got {amount}"
        )));
    }
    if amount < 0.0 {
        return Err(ConvertError::InvalidInput(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    Ok(amount)
}

/// Every currency code listed by any usable rate set, sorted and deduplicated
pub fn list_currencies(table: &RateTable) -> Vec<String> {
    table
        .rate_sets()
        .flat_map(|set| set.rates.keys())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Anchors holding usable rates, in table order
pub fn list_anchors(table: &RateTable) -> Vec<&str> {
    table.rate_sets().map(|set| set.anchor.as_str()).collect()
}

/// Anchors present in the table whose rates are unavailable
pub fn unavailable_anchors(table: &RateTable) -> Vec<&str> {
    table
        .entries()
        .filter(|(_, set)| set.is_none())
        .map(|(anchor, _)| anchor)
        .collect()
}

/// Trims and uppercases a user-entered currency code
pub fn normalize_code(input: &str) -> Result<String, ConvertError> {
    let code = input.trim().to_uppercase();
    if code.is_empty() {
        return Err(ConvertError::InvalidInput(
            "currency code must not be empty".to_string(),
        ));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConvertError::InvalidInput(format!(
            "'{}' is not a currency code",
            input.trim()
        )));
    }
    Ok(code)
}

/// Parses a user-entered amount
///
/// `,` is read as a decimal separator only when it is the single separator
/// and is not followed by exactly three digits (`12,5`). Otherwise commas must
/// group thousands (`1,000`, `1,234.5`) and are dropped. Any other placement
/// is rejected.
pub fn parse_amount(input: &str) -> Result<f64, ConvertError> {
    let trimmed = input.trim();
    let not_a_number = || ConvertError::InvalidInput(format!("'{trimmed}' is not a number"));

    let normalized = normalize_separators(trimmed).ok_or_else(not_a_number)?;
    let amount: f64 = normalized.parse().map_err(|_| not_a_number())?;
    validate_amount(amount)
}

/// Rewrites `input` into a plain `.`-decimal number, or `None` when its commas
/// fit neither a decimal nor a thousands-grouping reading
fn normalize_separators(input: &str) -> Option<String> {
    if !input.contains(',') {
        return Some(input.to_string());
    }

    let (integer, fraction) = match input.find('.') {
        Some(dot) => input.split_at(dot),
        None => {
            if let Some((whole, decimals)) = input.split_once(',') {
                let grouping = decimals.len() == 3 && decimals.chars().all(|c| c.is_ascii_digit());
                let has_whole = !whole.trim_start_matches(is_sign).is_empty();
                if has_whole && !decimals.contains(',') && !grouping {
                    return Some(format!("{whole}.{decimals}"));
                }
            }
            (input, "")
        }
    };

    let digits = integer.trim_start_matches(is_sign);
    let mut groups = digits.split(',');
    let leading = groups.next()?;
    let leading_ok = (1..=3).contains(&leading.len()) && leading.chars().all(|c| c.is_ascii_digit());
    let rest_ok = groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()));
    if !leading_ok || !rest_ok || fraction.contains(',') {
        return None;
    }

    Some(input.replace(',', ""))
}

fn is_sign(c: char) -> bool {
    c == '+' || c == '-'
}
