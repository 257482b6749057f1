#![deny(clippy::all)]

use crate::domain::CacheItem;
use async_trait::async_trait;
use shared::{Result, TtlMs};
use std::collections::HashMap;

// Ports are the two cache contracts the adapters translate between. An
// implementation of either contract can back a facade exposing the other.
//
// Mutating operations report operational failure as Ok(false), never as an
// error; the only error kind raised at this layer is Error::InvalidKey.

/// Key-value contract: direct access by key, with caller-supplied defaults
/// for misses and an optional per-entry TTL.
#[async_trait]
pub trait KeyValueCache<V>: Send + Sync + 'static {
    /// Fetch the value for `key`, or `default` on a miss.
    async fn get(&self, key: &str, default: Option<V>) -> Result<Option<V>>;

    /// Store `value` under `key`. Absent `ttl` means no expiration.
    async fn set(&self, key: &str, value: V, ttl: Option<TtlMs>) -> Result<bool>;

    async fn delete(&self, key: &str) -> Result<bool>;

    async fn clear(&self) -> Result<bool>;

    /// Fetch all of `keys` at once; the result holds one entry per requested
    /// key, misses filled with `default`.
    async fn get_many(
        &self,
        keys: &[String],
        default: Option<V>,
    ) -> Result<HashMap<String, Option<V>>>;

    /// Store every entry with the same TTL. True only if every store succeeded.
    async fn set_many(&self, entries: Vec<(String, V)>, ttl: Option<TtlMs>) -> Result<bool>;

    async fn delete_many(&self, keys: &[String]) -> Result<bool>;

    /// Point-in-time existence check; subject to races with concurrent writers.
    async fn has(&self, key: &str) -> Result<bool>;
}

/// Item-pool contract: retrieval yields a [`CacheItem`] tracking hit-state
/// and expiration, which the caller mutates and saves back.
#[async_trait]
pub trait ItemPool<V>: Send + Sync + 'static {
    /// Fetch the item for `key`. Always yields an item; a miss is an item
    /// with `is_hit() == false`.
    async fn get_item(&self, key: &str) -> Result<CacheItem<V>>;

    /// Batched [`get_item`](ItemPool::get_item): one item per requested key.
    async fn get_items(&self, keys: &[String]) -> Result<HashMap<String, CacheItem<V>>>;

    async fn has_item(&self, key: &str) -> Result<bool>;

    async fn clear(&self) -> Result<bool>;

    async fn delete_item(&self, key: &str) -> Result<bool>;

    async fn delete_items(&self, keys: &[String]) -> Result<bool>;

    /// Persist the item. The item is consumed; build a fresh one for the
    /// next write.
    async fn save(&self, item: CacheItem<V>) -> Result<bool>;

    /// Queue the item for a later [`commit`](ItemPool::commit). Pools without
    /// a write buffer persist immediately.
    async fn save_deferred(&self, item: CacheItem<V>) -> Result<bool>;

    /// Flush deferred saves. True when nothing was left queued.
    async fn commit(&self) -> Result<bool>;
}
