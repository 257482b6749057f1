use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use relay::domain::CacheItem;
use relay::ports::ItemPool;
use shared::Result;
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::debug;

struct Record<V> {
    value: V,
    expires_at: Option<DateTime<Utc>>,
}

/// Concurrent in-memory item pool. Records carry their expiration instant;
/// a read that finds a due record drops it and reports a miss.
///
/// There is no write buffer: deferred saves persist immediately and commit
/// has nothing to flush.
pub struct MemoryPool<V> {
    records: DashMap<String, Record<V>>,
}

impl<V> MemoryPool<V>
where
    V: Debug + Send + Sync + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    fn live_value(&self, key: &str) -> Option<V> {
        if let Some(record) = self.records.get(key) {
            let due = record
                .expires_at
                .is_some_and(|at| at <= Utc::now());
            if !due {
                return Some(record.value.clone());
            }
        } else {
            return None;
        }
        // The read guard is gone; now the due record can be dropped.
        debug!("dropping expired record for key {key:?}");
        self.records.remove(key);
        None
    }
}

impl<V> Default for MemoryPool<V>
where
    V: Debug + Send + Sync + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Debug for MemoryPool<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPool")
            .field("records", &self.records.len())
            .finish()
    }
}

#[async_trait]
impl<V> ItemPool<V> for MemoryPool<V>
where
    V: Debug + Send + Sync + Clone + 'static,
{
    async fn get_item(&self, key: &str) -> Result<CacheItem<V>> {
        Ok(match self.live_value(key) {
            Some(value) => CacheItem::hit(key, value),
            None => CacheItem::miss(key),
        })
    }

    async fn get_items(&self, keys: &[String]) -> Result<HashMap<String, CacheItem<V>>> {
        let mut items = HashMap::with_capacity(keys.len());
        for key in keys {
            let item = match self.live_value(key) {
                Some(value) => CacheItem::hit(key.clone(), value),
                None => CacheItem::miss(key.clone()),
            };
            items.insert(key.clone(), item);
        }
        Ok(items)
    }

    async fn has_item(&self, key: &str) -> Result<bool> {
        Ok(self.live_value(key).is_some())
    }

    async fn clear(&self) -> Result<bool> {
        self.records.clear();
        Ok(true)
    }

    async fn delete_item(&self, key: &str) -> Result<bool> {
        Ok(self.records.remove(key).is_some())
    }

    async fn delete_items(&self, keys: &[String]) -> Result<bool> {
        let mut all_existed = true;
        for key in keys {
            all_existed &= self.records.remove(key).is_some();
        }
        Ok(all_existed)
    }

    async fn save(&self, item: CacheItem<V>) -> Result<bool> {
        let (key, value, expires_at) = item.into_parts();
        let Some(value) = value else {
            return Ok(false);
        };
        self.records.insert(key, Record { value, expires_at });
        Ok(true)
    }

    async fn save_deferred(&self, item: CacheItem<V>) -> Result<bool> {
        self.save(item).await
    }

    async fn commit(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use shared::TtlMs;

    #[tokio::test]
    async fn test_memory_pool_save_then_get_item() {
        let pool: MemoryPool<&str> = MemoryPool::new();
        let mut item = pool.get_item("k").await.unwrap();
        assert!(!item.is_hit());

        item.set_value("v");
        assert!(pool.save(item).await.unwrap());

        let item = pool.get_item("k").await.unwrap();
        assert!(item.is_hit());
        assert_eq!(item.value(), Some(&"v"));
    }

    #[tokio::test]
    async fn test_memory_pool_expired_record_is_a_miss() {
        let pool = MemoryPool::new();
        let mut item = CacheItem::miss("k");
        item.set_value(1);
        item.expire_at(Some(Utc::now() - TimeDelta::milliseconds(10)));
        assert!(pool.save(item).await.unwrap());

        assert!(!pool.has_item("k").await.unwrap());
        assert!(!pool.get_item("k").await.unwrap().is_hit());
    }

    #[tokio::test]
    async fn test_memory_pool_future_expiration_still_live() {
        let pool = MemoryPool::new();
        let mut item = CacheItem::miss("k");
        item.set_value(1);
        item.expire_after(Some(TtlMs(60_000)));
        assert!(pool.save(item).await.unwrap());
        assert!(pool.has_item("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_pool_valueless_save_is_refused() {
        let pool: MemoryPool<u32> = MemoryPool::new();
        let item = CacheItem::miss("k");
        assert!(!pool.save(item).await.unwrap());
        assert!(!pool.has_item("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_pool_delete_and_clear() {
        let pool = MemoryPool::new();
        for key in ["a", "b"] {
            let mut item = CacheItem::miss(key);
            item.set_value(1);
            pool.save(item).await.unwrap();
        }

        assert!(pool.delete_item("a").await.unwrap());
        assert!(!pool.delete_item("a").await.unwrap());

        let keys: Vec<String> = vec!["b".to_string(), "absent".to_string()];
        assert!(!pool.delete_items(&keys).await.unwrap());

        pool.save(CacheItem::hit("c", 3)).await.unwrap();
        assert!(pool.clear().await.unwrap());
        assert!(!pool.has_item("c").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_pool_get_items_one_per_key() {
        let pool = MemoryPool::new();
        pool.save(CacheItem::hit("a", 1)).await.unwrap();

        let keys: Vec<String> = ["a", "b"].iter().map(|k| k.to_string()).collect();
        let items = pool.get_items(&keys).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items["a"].is_hit());
        assert!(!items["b"].is_hit());
    }

    #[tokio::test]
    async fn test_memory_pool_deferred_save_and_commit() {
        let pool = MemoryPool::new();
        let mut item = CacheItem::miss("k");
        item.set_value(9);
        assert!(pool.save_deferred(item).await.unwrap());
        assert!(pool.get_item("k").await.unwrap().is_hit());
        assert!(pool.commit().await.unwrap());
    }
}
