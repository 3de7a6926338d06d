//! Rate store persisting the rate table to a single JSON snapshot
//!
//! Provides a `RateStore` that decides freshness from the file's modification
//! time, loads the snapshot into a validated [`RateTable`], and saves it back
//! atomically.

use chrono::{DateTime, Duration, TimeZone, Utc};
use directories::ProjectDirs;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::{retain_valid_rates, RateSet, RateTable};

/// File name of the snapshot inside the cache directory
pub const CACHE_FILE_NAME: &str = "currency_rate.json";

/// Hours after which the snapshot is considered stale
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// Errors that can occur when loading or saving the snapshot
#[derive(Debug, Error)]
pub enum StoreError {
    /// The snapshot file does not exist
    #[error("Cache file {} not found", .0.display())]
    NotFound(PathBuf),

    /// The snapshot is not a JSON object
    #[error("Cache file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Reading or writing the snapshot failed
    #[error("I/O error on cache file {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// One anchor's entry as written to disk
#[derive(Debug, Serialize)]
struct SnapshotEntry<'a> {
    base_code: &'a str,
    rates: &'a IndexMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_last_update_unix: Option<i64>,
}

/// One anchor's entry as read from disk; unknown fields are ignored
#[derive(Debug, Deserialize)]
struct StoredRateSet {
    rates: IndexMap<String, f64>,
    #[serde(default)]
    time_last_update_unix: Option<i64>,
}

/// Reads and writes the rate snapshot file
///
/// The snapshot is a JSON object mapping each anchor code to the provider's
/// rate object (or `null` when that anchor could not be fetched). Freshness is
/// judged from the file's modification time rather than from its contents.
#[derive(Debug, Clone)]
pub struct RateStore {
    /// Location of the snapshot file
    path: PathBuf,
    /// Age after which the snapshot should be refreshed
    max_age: Duration,
}

impl RateStore {
    pub fn new(path: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            path: path.into(),
            max_age,
        }
    }

    /// Default snapshot location
    ///
    /// Uses `~/.cache/fxrates/currency_rate.json` on Linux, or the equivalent
    /// XDG path on other platforms. Falls back to the working directory when
    /// no home directory can be determined.
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("", "", "fxrates") {
            Some(dirs) => dirs.cache_dir().join(CACHE_FILE_NAME),
            None => PathBuf::from(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Whether the snapshot is missing, unreadable, or older than `max_age`
    pub fn is_stale(&self) -> bool {
        is_stale(&self.path, self.max_age)
    }

    /// Loads and validates the snapshot
    ///
    /// Entries without a usable `rates` object are kept as unavailable anchors.
    ///
    /// # Returns
    /// * `Ok(RateTable)` with entries in document order
    /// * `Err(StoreError::NotFound)` if the file does not exist
    /// * `Err(StoreError::Corrupt)` if it is not a JSON object
    /// * `Err(StoreError::Io)` for any other read failure
    pub fn load(&self) -> Result<RateTable, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()))
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        parse_snapshot(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the full snapshot, replacing any previous file atomically
    ///
    /// The JSON is written to a temporary file next to the target and renamed
    /// over it, so readers never observe a partially written snapshot.
    pub fn save(&self, table: &RateTable) -> Result<(), StoreError> {
        let io_error = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_error)?;

        let json = to_snapshot_json(table)
            .map_err(|e| io_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(json.as_bytes()).map_err(io_error)?;
        file.persist(&self.path).map_err(|e| io_error(e.error))?;

        debug!(path = %self.path.display(), anchors = table.len(), "saved rate snapshot");
        Ok(())
    }
}

/// Whether the file at `path` is missing, unreadable, or older than `max_age`
///
/// Any error while probing the file counts as stale.
pub fn is_stale(path: &Path, max_age: Duration) -> bool {
    let modified = fs::File::open(path)
        .and_then(|file| file.metadata())
        .and_then(|metadata| metadata.modified());

    match modified {
        Ok(modified) => {
            let modified: DateTime<Utc> = modified.into();
            Utc::now() - modified > max_age
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot determine cache age");
            true
        }
    }
}

fn parse_snapshot(content: &str) -> Result<RateTable, serde_json::Error> {
    let raw: IndexMap<String, serde_json::Value> = serde_json::from_str(content)?;

    let mut table = RateTable::new();
    for (anchor, value) in raw {
        if value.is_null() {
            table.insert_unavailable(anchor);
            continue;
        }

        match serde_json::from_value::<StoredRateSet>(value) {
            Ok(mut stored) => {
                retain_valid_rates(&anchor, &mut stored.rates);
                let last_updated = stored
                    .time_last_update_unix
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
                table.insert(RateSet::new(anchor, stored.rates).with_last_updated(last_updated));
            }
            Err(e) => {
                warn!(%anchor, error = %e, "ignoring cached entry without usable rates");
                table.insert_unavailable(anchor);
            }
        }
    }

    Ok(table)
}

fn to_snapshot_json(table: &RateTable) -> Result<String, serde_json::Error> {
    let snapshot: IndexMap<&str, Option<SnapshotEntry<'_>>> = table
        .entries()
        .map(|(anchor, set)| {
            let entry = set.map(|set| SnapshotEntry {
                base_code: anchor,
                rates: &set.rates,
                time_last_update_unix: set.last_updated.map(|ts| ts.timestamp()),
            });
            (anchor, entry)
        })
        .collect();

    serde_json::to_string_pretty(&snapshot)
}
