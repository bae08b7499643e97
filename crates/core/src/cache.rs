use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// Key/value store with a single time-to-live for every entry.
///
/// Expiry is passive: stale entries are ignored on read but stay in the map until the key is
/// written again. Growth is unbounded; callers are expected to use a small, stable key space.
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

impl<V: Clone> CacheStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let entry = self.entries.get(key)?;
        let age = now.signed_duration_since(entry.inserted_at);
        let fresh = match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => age < ttl,
            // TTL too large to represent: never expires.
            Err(_) => true,
        };
        fresh.then(|| entry.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_at(key, value, Utc::now());
    }

    pub fn set_at(&self, key: impl Into<String>, value: V, now: DateTime<Utc>) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 14, 30, 0).unwrap()
    }

    #[test]
    fn returns_value_within_ttl() {
        let cache = CacheStore::new(Duration::from_secs(60));
        cache.set_at("quote:AAPL", 181.5_f64, t0());

        let later = t0() + chrono::Duration::seconds(59);
        assert_eq!(cache.get_at("quote:AAPL", later), Some(181.5));
    }

    #[test]
    fn stale_entry_is_ignored_but_kept() {
        let cache = CacheStore::new(Duration::from_secs(60));
        cache.set_at("quote:AAPL", 181.5_f64, t0());

        let expired = t0() + chrono::Duration::seconds(60);
        assert_eq!(cache.get_at("quote:AAPL", expired), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn set_overwrites_and_restamps() {
        let cache = CacheStore::new(Duration::from_secs(60));
        cache.set_at("k", 1_u32, t0());
        let t1 = t0() + chrono::Duration::seconds(50);
        cache.set_at("k", 2_u32, t1);

        let t2 = t0() + chrono::Duration::seconds(100);
        assert_eq!(cache.get_at("k", t2), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_key_is_none() {
        let cache: CacheStore<String> = CacheStore::new(Duration::from_secs(300));
        assert!(cache.get("alerts:latest").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_never_serves() {
        let cache = CacheStore::new(Duration::ZERO);
        cache.set_at("k", "v".to_string(), t0());
        assert_eq!(cache.get_at("k", t0()), None);
    }
}
