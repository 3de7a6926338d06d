//! Core data models for fxrates
//!
//! Rate tables as fetched from the exchange-rate API and persisted to the
//! cache file. A table holds one entry per anchor currency; an entry is either
//! a usable [`RateSet`] or marked unavailable when its fetch failed or its
//! persisted data had no usable rates.

pub mod rates_api;

pub use rates_api::{ExchangeRateClient, FetchError, RateSource};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::warn;

/// Rates of every known currency expressed against one anchor currency
#[derive(Debug, Clone, PartialEq)]
pub struct RateSet {
    /// Currency the rates are quoted against
    pub anchor: String,
    /// Units of each currency per one unit of the anchor
    pub rates: IndexMap<String, f64>,
    /// When the upstream provider last updated these rates
    pub last_updated: Option<DateTime<Utc>>,
}

impl RateSet {
    /// Creates a rate set with no upstream timestamp
    pub fn new(anchor: impl Into<String>, rates: IndexMap<String, f64>) -> Self {
        Self {
            anchor: anchor.into(),
            rates,
            last_updated: None,
        }
    }

    /// Sets the upstream update timestamp
    pub fn with_last_updated(mut self, last_updated: Option<DateTime<Utc>>) -> Self {
        self.last_updated = last_updated;
        self
    }

    /// Rate of `code` against the anchor.
    ///
    /// The anchor itself is always 1.0, even when the provider did not list it.
    pub fn rate(&self, code: &str) -> Option<f64> {
        match self.rates.get(code) {
            Some(rate) => Some(*rate),
            None if code == self.anchor => Some(1.0),
            None => None,
        }
    }

    /// Whether this set can price `code`
    pub fn contains(&self, code: &str) -> bool {
        self.rate(code).is_some()
    }
}

/// Drops rates that cannot price anything: negative or non-finite values
///
/// Zero is kept; the resolver reports it as a zero rate when it is used.
pub(crate) fn retain_valid_rates(anchor: &str, rates: &mut IndexMap<String, f64>) {
    rates.retain(|code, rate| {
        let valid = rate.is_finite() && *rate >= 0.0;
        if !valid {
            warn!(%anchor, %code, rate = *rate, "dropping invalid rate");
        }
        valid
    });
}

/// All rate sets of one refresh, keyed by anchor code in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    entries: IndexMap<String, Option<RateSet>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a usable rate set under its anchor code
    pub fn insert(&mut self, set: RateSet) {
        self.entries.insert(set.anchor.clone(), Some(set));
    }

    /// Records an anchor whose rates could not be obtained
    pub fn insert_unavailable(&mut self, anchor: impl Into<String>) {
        self.entries.insert(anchor.into(), None);
    }

    /// Returns the usable rate set for `anchor`
    pub fn get(&self, anchor: &str) -> Option<&RateSet> {
        self.entries.get(anchor).and_then(Option::as_ref)
    }

    /// Whether `code` is an anchor with usable rates
    pub fn is_anchor(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Usable rate sets in table order
    pub fn rate_sets(&self) -> impl Iterator<Item = &RateSet> {
        self.entries.values().filter_map(Option::as_ref)
    }

    /// Every entry in table order, `None` for unavailable anchors
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&RateSet>)> {
        self.entries
            .iter()
            .map(|(anchor, set)| (anchor.as_str(), set.as_ref()))
    }

    /// Number of entries, including unavailable anchors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether at least one entry holds usable rates
    pub fn has_rates(&self) -> bool {
        self.rate_sets().next().is_some()
    }
}

impl FromIterator<RateSet> for RateTable {
    fn from_iter<I: IntoIterator<Item = RateSet>>(iter: I) -> Self {
        let mut table = RateTable::new();
        for set in iter {
            table.insert(set);
        }
        table
    }
}
