//! Exchange rate resolution over a rate table
//!
//! Every rate set is quoted against one anchor currency. A pair of arbitrary
//! currencies is priced by finding the anchor whose set lists the source
//! currency and dividing within that single set. Rebasing is single-hop: two
//! currencies that only appear under different anchors cannot be priced
//! against each other.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::trace;

use crate::data::{RateSet, RateTable};

/// Reasons a currency or pair cannot be priced
///
/// All variants are "not found" conditions the user can recover from by
/// choosing another currency.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// No anchor lists the currency
    #[error("Currency '{0}' not found in rate data")]
    UnknownCurrency(String),

    /// The currency is missing from the anchor set used for the pair
    #[error("No {anchor}-based rate for '{code}'")]
    NotInRateSet { code: String, anchor: String },

    /// The currency's rate is zero, so nothing can be rebased onto it
    #[error("Rate of '{code}' against {anchor} is zero")]
    ZeroRate { code: String, anchor: String },
}

/// Every anchor whose rate set can price `code`, in table order
pub fn anchors_containing<'t>(table: &'t RateTable, code: &str) -> Vec<&'t str> {
    table
        .rate_sets()
        .filter(|set| set.rates.contains_key(code))
        .map(|set| set.anchor.as_str())
        .collect()
}

/// Rate set used to price `code`: its own when `code` is an anchor, else the
/// first set in table order that lists it.
fn anchor_set<'t>(table: &'t RateTable, code: &str) -> Result<&'t RateSet, ResolveError> {
    if let Some(set) = table.get(code) {
        return Ok(set);
    }

    let candidates = anchors_containing(table, code);
    if candidates.len() > 1 {
        trace!(code, ?candidates, "currency listed under several anchors; using first");
    }

    candidates
        .first()
        .and_then(|anchor| table.get(anchor))
        .ok_or_else(|| ResolveError::UnknownCurrency(code.to_string()))
}

/// Finds the anchor currency used to price `code`
///
/// # Returns
/// * `code` itself if it is an anchor with usable rates
/// * otherwise the first anchor (table order) whose rates list `code`
/// * `Err(ResolveError::UnknownCurrency)` if no anchor lists it
pub fn find_anchor<'t>(table: &'t RateTable, code: &str) -> Result<&'t str, ResolveError> {
    anchor_set(table, code).map(|set| set.anchor.as_str())
}

/// All rates of the anchor set expressed against `base`
///
/// An anchor's own rates are returned unchanged. For any other currency the
/// anchor set listing it is divided through by its rate, so `base` maps to
/// exactly 1.0.
pub fn rates_relative_to(
    table: &RateTable,
    base: &str,
) -> Result<IndexMap<String, f64>, ResolveError> {
    if let Some(set) = table.get(base) {
        return Ok(set.rates.clone());
    }

    let set = anchor_set(table, base)?;
    let base_rate = set.rate(base).ok_or_else(|| ResolveError::NotInRateSet {
        code: base.to_string(),
        anchor: set.anchor.clone(),
    })?;
    if base_rate == 0.0 {
        return Err(ResolveError::ZeroRate {
            code: base.to_string(),
            anchor: set.anchor.clone(),
        });
    }

    Ok(set
        .rates
        .iter()
        .map(|(code, rate)| {
            let rebased = if code == base { 1.0 } else { rate / base_rate };
            (code.clone(), rebased)
        })
        .collect())
}

/// Units of `to` bought by one unit of `from`
///
/// Both currencies must be priced by the anchor set that resolves `from`;
/// there is no triangulation across two different anchors.
pub fn exchange_rate(table: &RateTable, from: &str, to: &str) -> Result<f64, ResolveError> {
    if from == to {
        return Ok(1.0);
    }

    let set = anchor_set(table, from)?;
    let missing = |code: &str| ResolveError::NotInRateSet {
        code: code.to_string(),
        anchor: set.anchor.clone(),
    };
    let from_rate = set.rate(from).ok_or_else(|| missing(from))?;
    let to_rate = set.rate(to).ok_or_else(|| missing(to))?;

    if from_rate == 0.0 {
        return Err(ResolveError::ZeroRate {
            code: from.to_string(),
            anchor: set.anchor.clone(),
        });
    }

    Ok(to_rate / from_rate)
}
