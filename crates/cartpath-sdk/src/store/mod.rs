//! Local key-value storage for offline continuity
//!
//! The stores keep small JSON blobs here as a mirror of their in-memory
//! state. The mirror is written after every mutation and read back only at
//! startup; malformed or missing content is treated as "nothing saved".

mod memory;
#[cfg(feature = "native")]
mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "native")]
pub use sqlite::SqliteStore;

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

/// Key for the persisted watchlist
pub const WATCHLIST_KEY: &str = "watchlist_items";
/// Key for the persisted plan history
pub const ROUTE_HISTORY_KEY: &str = "route_history";
/// Key for the persisted lifetime stats
pub const LIFETIME_STATS_KEY: &str = "lifetime_stats";

/// Durable device-local storage of small blobs, keyed by string
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous blob
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Read and decode a JSON blob. Missing, unreadable or malformed content
/// yields `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Failed to read local mirror");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding malformed local mirror");
            None
        }
    }
}

/// Encode and write a JSON blob. Failures are logged and reported as
/// `false`; callers keep their in-memory state either way.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key, error = %e, "Failed to encode local mirror");
            return false;
        }
    };

    match store.set(key, &bytes) {
        Ok(()) => {
            debug!(key, bytes = bytes.len(), "Persisted local mirror");
            true
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to write local mirror");
            false
        }
    }
}

/// Store whose every read and write fails, for exercising the
/// swallow-and-continue paths
#[cfg(test)]
pub(crate) struct FailingStore;

#[cfg(test)]
impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(crate::error::SdkError::Storage("disk unavailable".to_string()))
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<()> {
        Err(crate::error::SdkError::Storage("disk full".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_json_round_trip() {
        let store = MemoryStore::new();
        let value: HashMap<String, u32> = [("a".to_string(), 1)].into_iter().collect();

        assert!(save_json(&store, "k", &value));
        let loaded: Option<HashMap<String, u32>> = load_json(&store, "k");
        assert_eq!(loaded, Some(value));
    }

    #[test]
    fn test_malformed_blob_loads_as_none() {
        let store = MemoryStore::new();
        store.set("k", b"{not json").unwrap();

        let loaded: Option<Vec<String>> = load_json(&store, "k");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_store_errors_are_swallowed() {
        let loaded: Option<Vec<String>> = load_json(&FailingStore, "k");
        assert!(loaded.is_none());
        assert!(!save_json(&FailingStore, "k", &vec!["a"]));
    }

    #[test]
    fn test_missing_key_loads_as_none() {
        let store = MemoryStore::new();
        let loaded: Option<Vec<String>> = load_json(&store, "missing");
        assert!(loaded.is_none());
    }
}
