use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

/// Cache key for an authenticated API token lookup.
pub fn token_key(token: &str) -> String {
    format!("api_token:{token}")
}

/// Cache key for an account's aggregate delivery statistics.
pub fn stats_key(account_id: i32) -> String {
    format!("account_stats:{account_id}")
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-process TTL key-value cache shared by all requests.
///
/// Values are stored as JSON strings so entries stay inspectable and are not
/// tied to any in-memory representation. The cache is an optimization, never
/// a source of truth: when constructed disabled, every read misses and every
/// write is a no-op, so callers transparently fall back to the backing store.
pub struct CacheManager {
    entries: DashMap<String, CacheEntry>,
    enabled: bool,
}

impl CacheManager {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            enabled: true,
        }
    }

    /// A cache that ignores all operations. Used when caching is switched
    /// off in configuration or the cache failed to initialise.
    pub fn disabled() -> Self {
        Self {
            entries: DashMap::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the raw value for `key`, dropping it if its TTL has passed.
    pub fn get(&self, key: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.value.clone());
            }
        }
        // Expired entries are removed on the read path; writes are
        // last-writer-wins so a racing set simply reinstates the key.
        self.entries.remove_if(key, |_, e| e.expires_at <= Instant::now());
        None
    }

    pub fn set(&self, key: &str, value: String, ttl: Duration) {
        if !self.enabled {
            return;
        }
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn delete(&self, key: &str) -> bool {
        if !self.enabled {
            return false;
        }
        self.entries.remove(key).is_some()
    }

    /// Deserializes the cached JSON value for `key`. An undecodable entry is
    /// treated as a miss and evicted, so a format change can never wedge the
    /// read path.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                self.delete(key);
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, raw, ttl),
            Err(e) => warn!(key, error = %e, "failed to serialize cache value"),
        }
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn set_then_get_returns_value() {
        let cache = CacheManager::new();
        cache.set("k", "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = CacheManager::new();
        cache.set("k", "v".to_string(), Duration::from_secs(0));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn delete_removes_entry() {
        let cache = CacheManager::new();
        cache.set("k", "v".to_string(), Duration::from_secs(60));
        assert!(cache.delete("k"));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.delete("k"));
    }

    #[test]
    fn disabled_cache_ignores_operations() {
        let cache = CacheManager::disabled();
        cache.set("k", "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.delete("k"));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        id: i32,
        name: String,
    }

    #[test]
    fn json_round_trip() {
        let cache = CacheManager::new();
        let value = Snapshot {
            id: 3,
            name: "mail1".to_string(),
        };
        cache.set_json("snap", &value, Duration::from_secs(60));
        assert_eq!(cache.get_json::<Snapshot>("snap"), Some(value));
    }

    #[test]
    fn undecodable_entry_is_evicted() {
        let cache = CacheManager::new();
        cache.set("snap", "not json".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get_json::<Snapshot>("snap"), None);
        assert_eq!(cache.get("snap"), None);
    }

    #[test]
    fn last_writer_wins() {
        let cache = CacheManager::new();
        cache.set("k", "first".to_string(), Duration::from_secs(60));
        cache.set("k", "second".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some("second".to_string()));
    }
}
