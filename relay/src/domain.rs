use chrono::{DateTime, TimeDelta, Utc};
use shared::TtlMs;

/// One cache slot as seen through the item-pool contract.
///
/// Items are constructed fresh by the pool on every retrieval, including
/// misses, and consumed by `save`. Hit-state is fixed at construction: a
/// caller can build a [`miss`](CacheItem::miss) and assign a value to it,
/// but cannot turn it into a hit.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheItem<V> {
    key: String,
    value: Option<V>,
    is_hit: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl<V> CacheItem<V> {
    /// A slot the pool found populated.
    pub fn hit(key: impl Into<String>, value: V) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            is_hit: true,
            expires_at: None,
        }
    }

    /// A slot the pool found empty.
    pub fn miss(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            is_hit: false,
            expires_at: None,
        }
    }

    // A slot the underlying store reports present but whose value could not
    // be fetched. Reserved for the facade that produces it.
    pub(crate) fn hit_without_value(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            is_hit: true,
            expires_at: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn is_hit(&self) -> bool {
        self.is_hit
    }

    pub fn set_value(&mut self, value: V) {
        self.value = Some(value);
    }

    /// Expire at an absolute instant; `None` removes any expiration.
    pub fn expire_at(&mut self, at: Option<DateTime<Utc>>) {
        self.expires_at = at;
    }

    /// Expire after a relative duration from now; `None` removes any
    /// expiration.
    pub fn expire_after(&mut self, ttl: Option<TtlMs>) {
        self.expires_at = ttl.map(|t| Utc::now() + TimeDelta::milliseconds(t.0 as i64));
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn into_value(self) -> Option<V> {
        self.value
    }

    /// Decompose for persistence: key, value, absolute expiration.
    pub fn into_parts(self) -> (String, Option<V>, Option<DateTime<Utc>>) {
        (self.key, self.value, self.expires_at)
    }
}
