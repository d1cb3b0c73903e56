//! Page store trait and types.

use crate::error::Result;
use crate::key::CacheKey;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;

/// A stored page with the time it was cached.
///
/// The page is kept as a JSON value so one store can hold pages of different
/// item types.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    /// The serialized `PageResult`.
    pub value: Value,
    /// When the page was cached.
    pub cached_at: DateTime<Utc>,
}

impl CachedPage {
    /// A page cached now.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
        }
    }

    /// Age of the entry at `now`. Entries from the future have zero age.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the entry may still be served.
    ///
    /// `None` never expires; a zero lifetime is never live.
    pub fn is_live(&self, max_age: Option<Duration>, now: DateTime<Utc>) -> bool {
        match max_age {
            None => true,
            Some(max_age) => self.age(now) < max_age,
        }
    }
}

/// Namespace-isolated storage for cached pages.
///
/// All operations are synchronous; a cache never holds a store call across
/// an await point.
pub trait PageStore: Send + Sync {
    /// Get the page stored under `key`, live or not.
    fn get(&self, key: &CacheKey) -> Result<Option<CachedPage>>;

    /// Store a page, overwriting any existing entry with the same key.
    fn insert(&self, key: &CacheKey, page: CachedPage) -> Result<()>;

    /// Remove a single entry. Returns whether it existed.
    fn remove(&self, key: &CacheKey) -> Result<bool>;

    /// Remove every entry in a namespace. Returns the number removed.
    fn invalidate_namespace(&self, namespace: &str) -> Result<usize>;

    /// Remove entries in a namespace older than `max_age`.
    fn remove_expired(&self, namespace: &str, max_age: Duration) -> Result<usize>;

    /// Number of entries in a namespace.
    fn namespace_len(&self, namespace: &str) -> Result<usize>;
}
