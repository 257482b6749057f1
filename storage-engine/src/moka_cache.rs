use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use relay::ports::KeyValueCache;
use shared::{Result, TtlMs};
use std::collections::HashMap;
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// One stored value together with the TTL it was written with.
#[derive(Clone, Debug)]
struct Entry<V> {
    value: V,
    ttl: Option<Duration>,
}

/// Expiry policy that reads each entry's own TTL. No TTL means the entry
/// never expires.
struct EntryTtlExpiry;

impl<V> Expiry<String, Entry<V>> for EntryTtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // An overwrite carries its own TTL; the old deadline does not survive.
        entry.ttl
    }
}

/// Moka-backed key-value cache with per-entry TTL.
///
/// A `set` without a TTL falls back to the cache's default TTL, if one was
/// configured at construction.
pub struct MokaCache<V>
where
    V: Debug + Send + Sync + Clone + 'static,
{
    cache: Cache<String, Entry<V>>,
    default_ttl: Option<Duration>,
}

impl<V> MokaCache<V>
where
    V: Debug + Send + Sync + Clone + 'static,
{
    /// Create an unbounded cache with an optional default TTL.
    pub fn unbounded(default_ttl: Option<Duration>) -> Self {
        Self::build(None, default_ttl)
    }

    /// Create a cache bounded to `max_entries` with an optional default TTL.
    pub fn bounded(max_entries: u64, default_ttl: Option<Duration>) -> Self {
        Self::build(Some(max_entries), default_ttl)
    }

    fn build(max_entries: Option<u64>, default_ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().expire_after(EntryTtlExpiry);
        if let Some(max) = max_entries {
            builder = builder.max_capacity(max);
        }
        Self {
            cache: builder.build(),
            default_ttl,
        }
    }

    fn entry(&self, value: V, ttl: Option<TtlMs>) -> Entry<V> {
        Entry {
            value,
            ttl: ttl.map(TtlMs::as_duration).or(self.default_ttl),
        }
    }
}

#[async_trait]
impl<V> KeyValueCache<V> for MokaCache<V>
where
    V: Debug + Send + Sync + Clone + 'static,
{
    async fn get(&self, key: &str, default: Option<V>) -> Result<Option<V>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(default), // either never stored or TTL expired
        }
    }

    async fn set(&self, key: &str, value: V, ttl: Option<TtlMs>) -> Result<bool> {
        self.cache
            .insert(key.to_string(), self.entry(value, ttl))
            .await;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn clear(&self) -> Result<bool> {
        self.cache.invalidate_all();
        Ok(true)
    }

    async fn get_many(
        &self,
        keys: &[String],
        default: Option<V>,
    ) -> Result<HashMap<String, Option<V>>> {
        let mut values = HashMap::with_capacity(keys.len());
        for key in keys {
            let value = match self.cache.get(key).await {
                Some(entry) => Some(entry.value),
                None => default.clone(),
            };
            values.insert(key.clone(), value);
        }
        Ok(values)
    }

    async fn set_many(&self, entries: Vec<(String, V)>, ttl: Option<TtlMs>) -> Result<bool> {
        for (key, value) in entries {
            let entry = self.entry(value, ttl);
            self.cache.insert(key, entry).await;
        }
        Ok(true)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<bool> {
        let mut all_existed = true;
        for key in keys {
            all_existed &= self.cache.remove(key).await.is_some();
        }
        Ok(all_existed)
    }

    async fn has(&self, key: &str) -> Result<bool> {
        // contains_key can see expired entries that eviction has not
        // reclaimed yet; a read cannot.
        Ok(self.cache.get(key).await.is_some())
    }
}

impl<V> Debug for MokaCache<V>
where
    V: Debug + Send + Sync + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_moka_cache_set_and_get() {
        let cache = MokaCache::unbounded(None);
        assert!(cache.set("hello", "world", None).await.unwrap());
        assert_eq!(cache.get("hello", None).await.unwrap(), Some("world"));
    }

    #[tokio::test]
    async fn test_moka_cache_get_miss_yields_default() {
        let cache: MokaCache<&str> = MokaCache::unbounded(None);
        assert_eq!(cache.get("absent", None).await.unwrap(), None);
        assert_eq!(
            cache.get("absent", Some("fallback")).await.unwrap(),
            Some("fallback")
        );
    }

    #[tokio::test]
    async fn test_moka_cache_delete() {
        let cache = MokaCache::unbounded(None);
        cache.set("k", "v", None).await.unwrap();
        assert!(cache.delete("k").await.unwrap());
        assert!(!cache.delete("k").await.unwrap());
        assert_eq!(cache.get("k", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_moka_cache_overwrite() {
        let cache = MokaCache::unbounded(None);
        cache.set("k", "value1", None).await.unwrap();
        cache.set("k", "value2", None).await.unwrap();
        assert_eq!(cache.get("k", None).await.unwrap(), Some("value2"));
    }

    #[tokio::test]
    async fn test_moka_cache_per_entry_ttl_expires() {
        let cache = MokaCache::unbounded(None);
        cache.set("short", "v", Some(TtlMs(100))).await.unwrap();
        cache.set("stable", "v", None).await.unwrap();

        assert!(cache.has("short").await.unwrap());
        sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get("short", None).await.unwrap(), None);
        assert_eq!(cache.get("stable", None).await.unwrap(), Some("v"));
    }

    #[tokio::test]
    async fn test_moka_cache_overwrite_replaces_ttl() {
        let cache = MokaCache::unbounded(None);
        cache.set("k", "v", Some(TtlMs(100))).await.unwrap();
        // The overwrite has no TTL, so the original deadline must not fire.
        cache.set("k", "v2", None).await.unwrap();

        sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get("k", None).await.unwrap(), Some("v2"));
    }

    #[tokio::test]
    async fn test_moka_cache_default_ttl_applies_when_set_has_none() {
        let cache = MokaCache::unbounded(Some(Duration::from_millis(100)));
        cache.set("k", "v", None).await.unwrap();
        assert_eq!(cache.get("k", None).await.unwrap(), Some("v"));

        sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get("k", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_moka_cache_bulk_operations() {
        let cache = MokaCache::unbounded(None);
        let entries = vec![("a".to_string(), 1), ("b".to_string(), 2)];
        assert!(cache.set_many(entries, None).await.unwrap());

        let keys: Vec<String> = ["a", "b", "c"].iter().map(|k| k.to_string()).collect();
        let values = cache.get_many(&keys, Some(0)).await.unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values["a"], Some(1));
        assert_eq!(values["b"], Some(2));
        assert_eq!(values["c"], Some(0));

        let present: Vec<String> = ["a", "b"].iter().map(|k| k.to_string()).collect();
        assert!(cache.delete_many(&present).await.unwrap());
        assert!(!cache.delete_many(&present).await.unwrap());
    }

    #[tokio::test]
    async fn test_moka_cache_clear_and_has() {
        let cache = MokaCache::unbounded(None);
        cache.set("k", "v", None).await.unwrap();
        assert!(cache.has("k").await.unwrap());
        assert!(cache.clear().await.unwrap());
        assert!(!cache.has("k").await.unwrap());
    }
}
