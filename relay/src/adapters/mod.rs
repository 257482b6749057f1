pub mod kv_backed;
pub mod pool_backed;

pub use kv_backed::KeyValueItemPool;
pub use pool_backed::PooledKeyValueCache;
