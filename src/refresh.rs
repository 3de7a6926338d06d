//! Rate refresh cycle
//!
//! Fetches every configured anchor from a [`RateSource`] into a fresh
//! [`RateTable`], and gates that fetch on the freshness of the cached
//! snapshot.

use tracing::{info, warn};

use crate::cache::{RateStore, StoreError};
use crate::data::{RateSource, RateTable};

/// Where the rates of a session came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatesOrigin {
    /// Snapshot was fresh and loaded from disk
    Cache,
    /// Rates were fetched from upstream during this run
    Fresh,
    /// Refresh failed for every anchor; an outdated snapshot is in use
    StaleCache,
}

/// Rate table for a session together with its origin
#[derive(Debug, Clone)]
pub struct LoadedRates {
    pub table: RateTable,
    pub origin: RatesOrigin,
}

/// Fetches each anchor in order and assembles a complete table
///
/// A failed fetch marks that anchor unavailable instead of aborting the
/// refresh, so the result may be partial.
pub async fn refresh<S: RateSource + ?Sized>(source: &S, anchors: &[String]) -> RateTable {
    let mut table = RateTable::new();

    for anchor in anchors {
        match source.fetch_rates(anchor).await {
            Ok(set) => {
                info!(%anchor, currencies = set.rates.len(), "fetched rates");
                table.insert(set);
            }
            Err(e) => {
                warn!(%anchor, error = %e, "rate fetch failed; anchor unavailable");
                table.insert_unavailable(anchor.clone());
            }
        }
    }

    table
}

/// Loads the cached snapshot, refreshing it first when stale
///
/// # Arguments
/// * `store` - Snapshot location and freshness window
/// * `source` - Upstream used when a refresh is needed
/// * `anchors` - Anchor currencies to fetch, in order
/// * `force` - Refresh even when the snapshot is fresh
///
/// # Behavior
/// - A fresh snapshot is loaded as is; a corrupt one triggers a refresh
/// - A refreshed table is saved; a failed save is logged and the table is
///   still returned
/// - If no anchor could be refreshed, an existing snapshot is returned as
///   `StaleCache` and left untouched on disk; without one, nothing is saved
///   so the next run tries again
pub async fn load_or_refresh<S: RateSource + ?Sized>(
    store: &RateStore,
    source: &S,
    anchors: &[String],
    force: bool,
) -> Result<LoadedRates, StoreError> {
    if !force && !store.is_stale() {
        match store.load() {
            Ok(table) => {
                info!(path = %store.path().display(), "using cached rates");
                return Ok(LoadedRates {
                    table,
                    origin: RatesOrigin::Cache,
                });
            }
            Err(err @ StoreError::Corrupt { .. }) => {
                warn!(error = %err, "cached rates unreadable; refreshing");
            }
            Err(err) => return Err(err),
        }
    } else {
        info!(path = %store.path().display(), force, "cached rates missing or stale; refreshing");
    }

    let table = refresh(source, anchors).await;

    if !table.has_rates() {
        if let Ok(previous) = store.load() {
            warn!("no anchor could be refreshed; using stale cached rates");
            return Ok(LoadedRates {
                table: previous,
                origin: RatesOrigin::StaleCache,
            });
        }
        warn!("no anchor could be refreshed; nothing saved");
        return Ok(LoadedRates {
            table,
            origin: RatesOrigin::Fresh,
        });
    }

    if let Err(e) = store.save(&table) {
        warn!(error = %e, "failed to save rates; continuing with in-memory table");
    }

    Ok(LoadedRates {
        table,
        origin: RatesOrigin::Fresh,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CACHE_FILE_NAME;
    use crate::data::fixtures::{rate_set, sample_table};
    use crate::data::{FetchError, RateSet};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;
    use std::time::{Duration as StdDuration, SystemTime};
    use tempfile::TempDir;

    /// Serves canned rate sets and records which anchors were requested
    #[derive(Default)]
    struct FakeSource {
        sets: HashMap<String, RateSet>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with_sets(sets: Vec<RateSet>) -> Self {
            Self {
                sets: sets.into_iter().map(|s| (s.anchor.clone(), s)).collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RateSource for FakeSource {
        async fn fetch_rates(&self, anchor: &str) -> Result<RateSet, FetchError> {
            self.requests.lock().unwrap().push(anchor.to_string());
            self.sets.get(anchor).cloned().ok_or_else(|| FetchError::Status {
                anchor: anchor.to_string(),
                status: 500,
            })
        }
    }

    fn anchors(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn create_test_store() -> (RateStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RateStore::new(temp_dir.path().join(CACHE_FILE_NAME), Duration::hours(24));
        (store, temp_dir)
    }

    fn age_snapshot(store: &RateStore, hours: u64) {
        let file = fs::File::options().write(true).open(store.path()).unwrap();
        file.set_modified(SystemTime::now() - StdDuration::from_secs(hours * 3600))
            .unwrap();
    }

    #[tokio::test]
    async fn test_refresh_fetches_anchors_in_order() {
        let source = FakeSource::with_sets(vec![
            rate_set("EUR", &[("EUR", 1.0), ("USD", 1.1)]),
            rate_set("USD", &[("USD", 1.0), ("EUR", 0.9)]),
        ]);

        let table = refresh(&source, &anchors(&["USD", "EUR"])).await;

        assert_eq!(source.requests(), vec!["USD", "EUR"]);
        let order: Vec<&str> = table.entries().map(|(a, _)| a).collect();
        assert_eq!(order, vec!["USD", "EUR"]);
    }

    #[tokio::test]
    async fn test_refresh_keeps_going_after_failed_anchor() {
        let source = FakeSource::with_sets(vec![
            rate_set("USD", &[("USD", 1.0)]),
            rate_set("GBP", &[("GBP", 1.0)]),
        ]);

        let table = refresh(&source, &anchors(&["USD", "RUB", "GBP"])).await;

        assert_eq!(source.requests(), vec!["USD", "RUB", "GBP"]);
        assert_eq!(table.len(), 3);
        assert!(table.is_anchor("USD"));
        assert!(!table.is_anchor("RUB"));
        assert!(table.is_anchor("GBP"));
    }

    #[tokio::test]
    async fn test_missing_cache_is_refreshed_and_saved() {
        let (store, _temp_dir) = create_test_store();
        let source = FakeSource::with_sets(vec![rate_set("USD", &[("USD", 1.0), ("EUR", 0.9)])]);

        let loaded = load_or_refresh(&store, &source, &anchors(&["USD", "RUB"]), false)
            .await
            .unwrap();

        assert_eq!(loaded.origin, RatesOrigin::Fresh);
        assert!(loaded.table.is_anchor("USD"));
        assert!(!store.is_stale(), "Snapshot should have been written");

        let saved = store.load().unwrap();
        assert_eq!(saved, loaded.table);
        assert_eq!(saved.len(), 2, "Failed anchor is persisted as unavailable");
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_fetch() {
        let (store, _temp_dir) = create_test_store();
        store.save(&sample_table()).unwrap();
        let source = FakeSource::default();

        let loaded = load_or_refresh(&store, &source, &anchors(&["USD"]), false)
            .await
            .unwrap();

        assert_eq!(loaded.origin, RatesOrigin::Cache);
        assert!(source.requests().is_empty(), "Fresh cache must not hit upstream");
        assert_eq!(loaded.table, sample_table());
    }

    #[tokio::test]
    async fn test_force_refreshes_fresh_cache() {
        let (store, _temp_dir) = create_test_store();
        store.save(&sample_table()).unwrap();
        let source = FakeSource::with_sets(vec![rate_set("EUR", &[("EUR", 1.0), ("USD", 1.1)])]);

        let loaded = load_or_refresh(&store, &source, &anchors(&["EUR"]), true)
            .await
            .unwrap();

        assert_eq!(loaded.origin, RatesOrigin::Fresh);
        assert_eq!(source.requests(), vec!["EUR"]);
        assert!(!store.load().unwrap().is_anchor("USD"), "Refresh replaces the snapshot");
    }

    #[tokio::test]
    async fn test_stale_cache_is_refreshed() {
        let (store, _temp_dir) = create_test_store();
        store.save(&sample_table()).unwrap();
        age_snapshot(&store, 25);
        let source = FakeSource::with_sets(vec![rate_set("EUR", &[("EUR", 1.0)])]);

        let loaded = load_or_refresh(&store, &source, &anchors(&["EUR"]), false)
            .await
            .unwrap();

        assert_eq!(loaded.origin, RatesOrigin::Fresh);
        assert_eq!(source.requests(), vec!["EUR"]);
    }

    #[tokio::test]
    async fn test_total_refresh_failure_falls_back_to_stale_cache() {
        let (store, _temp_dir) = create_test_store();
        store.save(&sample_table()).unwrap();
        age_snapshot(&store, 48);
        let source = FakeSource::default();

        let loaded = load_or_refresh(&store, &source, &anchors(&["USD", "EUR"]), false)
            .await
            .unwrap();

        assert_eq!(loaded.origin, RatesOrigin::StaleCache);
        assert_eq!(loaded.table, sample_table());
        assert!(store.is_stale(), "Stale snapshot must not be overwritten");
    }

    #[tokio::test]
    async fn test_total_refresh_failure_without_cache_returns_empty_table() {
        let (store, _temp_dir) = create_test_store();
        let source = FakeSource::default();

        let loaded = load_or_refresh(&store, &source, &anchors(&["USD"]), false)
            .await
            .unwrap();

        assert_eq!(loaded.origin, RatesOrigin::Fresh);
        assert!(!loaded.table.has_rates());
        assert!(
            !store.path().exists(),
            "A table without rates must not be saved"
        );
    }

    #[tokio::test]
    async fn test_next_run_retries_after_total_failure() {
        let (store, _temp_dir) = create_test_store();
        let offline = FakeSource::default();
        load_or_refresh(&store, &offline, &anchors(&["USD"]), false)
            .await
            .unwrap();

        let online = FakeSource::with_sets(vec![rate_set("USD", &[("USD", 1.0), ("EUR", 0.9)])]);
        let loaded = load_or_refresh(&store, &online, &anchors(&["USD"]), false)
            .await
            .unwrap();

        assert_eq!(online.requests(), vec!["USD"]);
        assert_eq!(loaded.origin, RatesOrigin::Fresh);
        assert!(loaded.table.is_anchor("USD"));
    }

    #[tokio::test]
    async fn test_corrupt_fresh_cache_is_refreshed() {
        let (store, _temp_dir) = create_test_store();
        fs::write(store.path(), "not json").unwrap();
        let source = FakeSource::with_sets(vec![rate_set("USD", &[("USD", 1.0)])]);

        let loaded = load_or_refresh(&store, &source, &anchors(&["USD"]), false)
            .await
            .unwrap();

        assert_eq!(loaded.origin, RatesOrigin::Fresh);
        assert!(store.load().is_ok(), "Corrupt snapshot should be replaced");
    }

    #[tokio::test]
    async fn test_unreadable_fresh_cache_is_an_error() {
        let (store, _temp_dir) = create_test_store();
        fs::create_dir(store.path()).unwrap();
        let source = FakeSource::default();

        let result = load_or_refresh(&store, &source, &anchors(&["USD"]), false).await;

        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert!(source.requests().is_empty());
    }
}
