//! Reference in-process backends for the two cache contracts.
//!
//! [`MokaCache`] implements the key-value contract over moka with real
//! per-entry TTL; [`MemoryPool`] implements the item-pool contract over a
//! concurrent map. Both are meant for tests and for callers who want a
//! working cache without bringing their own store.

mod memory_pool;
mod moka_cache;

pub use memory_pool::MemoryPool;
pub use moka_cache::MokaCache;
