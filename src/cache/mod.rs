//! Cache module for persisting exchange rates to disk
//!
//! The whole rate table lives in one JSON snapshot file. Freshness comes from
//! the file's modification time; a stale or missing snapshot triggers a
//! refresh (see [`crate::refresh`]).

mod store;

pub use store::{is_stale, RateStore, StoreError, CACHE_FILE_NAME, DEFAULT_MAX_AGE_HOURS};
