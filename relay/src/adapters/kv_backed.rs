use crate::domain::CacheItem;
use crate::keys;
use crate::ports::{ItemPool, KeyValueCache};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use shared::{Result, TtlMs};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, trace};

/// Item-pool facade over a key-value cache.
///
/// Items are produced on retrieval and converted back to plain key-value
/// writes on save; absolute expiration instants become the remaining
/// duration at the moment of the save. The facade never buffers writes, so
/// deferred saves are immediate and commit has nothing to flush.
#[derive(Clone)]
pub struct KeyValueItemPool<V> {
    cache: Arc<dyn KeyValueCache<V>>,
}

impl<V> KeyValueItemPool<V> {
    pub fn new(cache: Arc<dyn KeyValueCache<V>>) -> Self {
        Self { cache }
    }
}

impl<V> Debug for KeyValueItemPool<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueItemPool").finish_non_exhaustive()
    }
}

impl<V> KeyValueItemPool<V>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    // Hit rule: a fetched value is a hit, and so is a key the store still
    // reports present even though no value came back. The second half keeps
    // a slot written concurrently with the fetch from reading as a miss.
    fn item_for(key: &str, value: Option<V>, present: bool) -> CacheItem<V> {
        match value {
            Some(v) => CacheItem::hit(key, v),
            None if present => CacheItem::hit_without_value(key),
            None => CacheItem::miss(key),
        }
    }
}

#[async_trait]
impl<V> ItemPool<V> for KeyValueItemPool<V>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    async fn get_item(&self, key: &str) -> Result<CacheItem<V>> {
        keys::validate_key(key)?;
        let value = self.cache.get(key, None).await?;
        let present = match value {
            Some(_) => true,
            None => self.cache.has(key).await?,
        };
        Ok(Self::item_for(key, value, present))
    }

    async fn get_items(&self, keys: &[String]) -> Result<HashMap<String, CacheItem<V>>> {
        keys::validate_keys(keys)?;
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        trace!("get_items: {} key(s) via key-value store", keys.len());
        let mut values = self.cache.get_many(keys, None).await?;

        // Apparent misses get the same existence re-check as get_item.
        let unresolved: Vec<&String> = keys
            .iter()
            .filter(|key| !matches!(values.get(*key), Some(Some(_))))
            .collect();
        let checks = try_join_all(unresolved.iter().map(|key| self.cache.has(key.as_str()))).await?;
        let present: HashSet<&String> = unresolved
            .into_iter()
            .zip(checks)
            .filter_map(|(key, present)| present.then_some(key))
            .collect();

        let mut items = HashMap::with_capacity(keys.len());
        for key in keys {
            let value = values.remove(key).flatten();
            let item = Self::item_for(key, value, present.contains(key));
            items.insert(key.clone(), item);
        }
        Ok(items)
    }

    async fn has_item(&self, key: &str) -> Result<bool> {
        keys::validate_key(key)?;
        self.cache.has(key).await
    }

    async fn clear(&self) -> Result<bool> {
        self.cache.clear().await
    }

    async fn delete_item(&self, key: &str) -> Result<bool> {
        keys::validate_key(key)?;
        self.cache.delete(key).await
    }

    async fn delete_items(&self, keys: &[String]) -> Result<bool> {
        keys::validate_keys(keys)?;
        self.cache.delete_many(keys).await
    }

    async fn save(&self, item: CacheItem<V>) -> Result<bool> {
        keys::validate_key(item.key())?;
        let (key, value, expires_at) = item.into_parts();
        let Some(value) = value else {
            // The key-value contract has no representation for a valueless
            // slot; report the save as failed rather than invent one.
            debug!("save: refusing item {key:?} with no value");
            return Ok(false);
        };
        let ttl = expires_at.map(|at| {
            let remaining = at.signed_duration_since(Utc::now()).num_milliseconds();
            TtlMs(remaining.max(0) as u64)
        });
        self.cache.set(&key, value, ttl).await
    }

    async fn save_deferred(&self, item: CacheItem<V>) -> Result<bool> {
        // No write buffer: a deferred save is an immediate one.
        self.save(item).await
    }

    async fn commit(&self) -> Result<bool> {
        Ok(true)
    }
}
