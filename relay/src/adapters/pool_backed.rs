use crate::domain::CacheItem;
use crate::keys;
use crate::ports::{ItemPool, KeyValueCache};
use async_trait::async_trait;
use shared::{Result, TtlMs};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{trace, warn};

/// Key-value facade over an item-pool cache.
///
/// Every operation validates its keys, then delegates to the wrapped pool;
/// the facade holds no state of its own.
#[derive(Clone)]
pub struct PooledKeyValueCache<V> {
    pool: Arc<dyn ItemPool<V>>,
}

impl<V> PooledKeyValueCache<V> {
    pub fn new(pool: Arc<dyn ItemPool<V>>) -> Self {
        Self { pool }
    }
}

impl<V> Debug for PooledKeyValueCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledKeyValueCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl<V> KeyValueCache<V> for PooledKeyValueCache<V>
where
    V: Clone + Debug + Send + Sync + 'static,
{
    async fn get(&self, key: &str, default: Option<V>) -> Result<Option<V>> {
        keys::validate_key(key)?;
        let item = self.pool.get_item(key).await?;
        if item.is_hit() {
            Ok(item.into_value())
        } else {
            Ok(default)
        }
    }

    async fn set(&self, key: &str, value: V, ttl: Option<TtlMs>) -> Result<bool> {
        keys::validate_key(key)?;
        let mut item = self.pool.get_item(key).await?;
        item.set_value(value);
        item.expire_after(ttl);
        self.pool.save(item).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        keys::validate_key(key)?;
        self.pool.delete_item(key).await
    }

    async fn clear(&self) -> Result<bool> {
        self.pool.clear().await
    }

    async fn get_many(
        &self,
        keys: &[String],
        default: Option<V>,
    ) -> Result<HashMap<String, Option<V>>> {
        keys::validate_keys(keys)?;
        trace!("get_many: {} key(s) via item pool", keys.len());
        let mut items = self.pool.get_items(keys).await?;
        let mut values = HashMap::with_capacity(keys.len());
        for key in keys {
            let value = match items.remove(key) {
                Some(item) if item.is_hit() => item.into_value(),
                _ => default.clone(),
            };
            values.insert(key.clone(), value);
        }
        Ok(values)
    }

    async fn set_many(&self, entries: Vec<(String, V)>, ttl: Option<TtlMs>) -> Result<bool> {
        let batch: Vec<String> = entries.iter().map(|(key, _)| key.clone()).collect();
        keys::validate_keys(&batch)?;
        trace!("set_many: {} entry(ies) via item pool", batch.len());
        let mut items = self.pool.get_items(&batch).await?;

        // Saves are individual and are not rolled back: a failure mid-batch
        // leaves earlier entries persisted and the overall result false.
        let mut all_saved = true;
        for (key, value) in entries {
            let mut item = items.remove(&key).unwrap_or_else(|| CacheItem::miss(&key));
            item.set_value(value);
            item.expire_after(ttl);
            if !self.pool.save(item).await? {
                warn!("set_many: save failed for key {key:?}");
                all_saved = false;
            }
        }
        Ok(all_saved)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<bool> {
        keys::validate_keys(keys)?;
        self.pool.delete_items(keys).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        keys::validate_key(key)?;
        self.pool.has_item(key).await
    }
}
