//! In-process page store.

use super::traits::{CachedPage, PageStore};
use crate::error::{PagerError, Result};
use crate::key::CacheKey;
use chrono::Utc;
use mini_moka::sync::Cache;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Pages of one namespace, keyed by `CacheKey::entry_key`.
type NamespaceCache = Cache<String, CachedPage>;

/// Page store backed by one `mini_moka` cache per namespace.
///
/// The capacity bounds each namespace separately, so a busy cache sharing
/// the store never evicts another cache's pages. Eviction within a namespace
/// follows the moka admission policy and may lag slightly behind inserts.
/// Expiry is not enforced here; callers compare `cached_at` against their own
/// page lifetime.
#[derive(Default)]
pub struct MemoryPageStore {
    namespaces: Mutex<HashMap<String, NamespaceCache>>,
    capacity: Option<u64>,
}

impl MemoryPageStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding at most `capacity` pages per namespace.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            namespaces: Mutex::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    /// Per-namespace capacity, if bounded.
    pub fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    /// Total number of entries across all namespaces.
    pub fn len(&self) -> usize {
        self.lock()
            .map(|namespaces| namespaces.values().map(|cache| cache.iter().count()).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, NamespaceCache>>> {
        self.namespaces
            .lock()
            .map_err(|e| PagerError::Other(format!("Failed to lock page store: {}", e)))
    }

    /// The cache for `namespace`, if it has ever been written.
    fn namespace(&self, namespace: &str) -> Result<Option<NamespaceCache>> {
        Ok(self.lock()?.get(namespace).cloned())
    }

    fn build_namespace(&self) -> NamespaceCache {
        let builder = Cache::builder();
        match self.capacity {
            Some(capacity) => builder.max_capacity(capacity).build(),
            None => builder.build(),
        }
    }
}

impl fmt::Debug for MemoryPageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPageStore")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl PageStore for MemoryPageStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CachedPage>> {
        Ok(self
            .namespace(key.namespace())?
            .and_then(|cache| cache.get(&key.entry_key())))
    }

    fn insert(&self, key: &CacheKey, page: CachedPage) -> Result<()> {
        if self.capacity == Some(0) {
            return Ok(());
        }

        let cache = {
            let mut namespaces = self.lock()?;
            namespaces
                .entry(key.namespace().to_string())
                .or_insert_with(|| {
                    debug!("Creating page cache for namespace {}", key.namespace());
                    self.build_namespace()
                })
                .clone()
        };
        cache.insert(key.entry_key(), page);
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<bool> {
        let Some(cache) = self.namespace(key.namespace())? else {
            return Ok(false);
        };
        let entry_key = key.entry_key();
        let existed = cache.contains_key(&entry_key);
        cache.invalidate(&entry_key);
        Ok(existed)
    }

    fn invalidate_namespace(&self, namespace: &str) -> Result<usize> {
        let removed = self.lock()?.remove(namespace);
        Ok(removed.map_or(0, |cache| {
            let count = cache.iter().count();
            cache.invalidate_all();
            count
        }))
    }

    fn remove_expired(&self, namespace: &str, max_age: Duration) -> Result<usize> {
        let Some(cache) = self.namespace(namespace)? else {
            return Ok(0);
        };

        let now = Utc::now();
        let expired: Vec<String> = cache
            .iter()
            .filter(|entry| !entry.value().is_live(Some(max_age), now))
            .map(|entry| entry.key().clone())
            .collect();
        for entry_key in &expired {
            cache.invalidate(entry_key);
        }
        Ok(expired.len())
    }

    fn namespace_len(&self, namespace: &str) -> Result<usize> {
        Ok(self
            .namespace(namespace)?
            .map_or(0, |cache| cache.iter().count()))
    }
}
