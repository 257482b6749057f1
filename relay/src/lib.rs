//! Bidirectional adapters between two cache access contracts.
//!
//! Two contracts coexist in the wild: a key-value style (`get`/`set`/`delete`
//! with defaults and TTLs) and an item-pool style (retrieval yields a
//! [`CacheItem`](domain::CacheItem) carrying hit-state and expiration, which
//! is mutated and saved back). The adapters in this crate let code written
//! against either contract run on an implementation of the other:
//!
//! - [`PooledKeyValueCache`] presents the key-value contract over an
//!   [`ItemPool`](ports::ItemPool);
//! - [`KeyValueItemPool`] presents the item-pool contract over a
//!   [`KeyValueCache`](ports::KeyValueCache).
//!
//! Both are pure translation layers: no storage, no eviction, no state of
//! their own. All real caching behavior belongs to the injected
//! implementation.

pub mod adapters;
pub mod domain;
pub mod keys;
pub mod ports;

pub use adapters::{KeyValueItemPool, PooledKeyValueCache};
pub use domain::CacheItem;
pub use ports::{ItemPool, KeyValueCache};
