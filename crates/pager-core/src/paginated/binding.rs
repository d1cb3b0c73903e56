//! Binding a cache to a view that re-acquires it on every render.
//!
//! A view layer typically asks for "its" cache each time it renders, passing
//! the same settings again. [`CacheBinding`] builds the cache once and checks
//! later calls against the original construction parameters, so an
//! accidental per-render reconfiguration is caught instead of silently
//! producing a second, inconsistent cache.

use super::PaginatedCache;
use crate::config::{CacheSettings, InvariantMode};
use crate::error::{PagerError, Result};
use crate::fetcher::Fetcher;
use crate::store::PageStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

struct Bound<T, P> {
    settings: CacheSettings,
    store: Arc<dyn PageStore>,
    cache: Arc<PaginatedCache<T, P>>,
}

/// Holds one logical cache and guards its construction parameters.
pub struct CacheBinding<T, P = serde_json::Value> {
    mode: InvariantMode,
    bound: Mutex<Option<Bound<T, P>>>,
}

impl<T, P> Default for CacheBinding<T, P> {
    fn default() -> Self {
        Self::with_mode(InvariantMode::from_build())
    }
}

impl<T, P> CacheBinding<T, P> {
    /// A binding using the build's invariant mode.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: InvariantMode) -> Self {
        Self {
            mode,
            bound: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> InvariantMode {
        self.mode
    }

    pub fn is_bound(&self) -> bool {
        self.lock().is_some()
    }

    /// The bound cache, if any.
    pub fn current(&self) -> Option<Arc<PaginatedCache<T, P>>> {
        self.lock().as_ref().map(|bound| bound.cache.clone())
    }

    /// Release the bound cache so the next `bind` builds a fresh one.
    pub fn unbind(&self) -> Option<Arc<PaginatedCache<T, P>>> {
        self.lock().take().map(|bound| bound.cache)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Bound<T, P>>> {
        self.bound.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, P> CacheBinding<T, P>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    P: Serialize + Clone + Send + Sync + 'static,
{
    /// Get the bound cache, building it on first use.
    ///
    /// `make_fetcher` only runs when the cache is built. On later calls the
    /// settings and store must match the first call. A mismatch returns
    /// [`PagerError::ConfigChanged`] in strict mode; in relaxed mode it is
    /// logged and the original cache is returned unchanged.
    pub fn bind<F, X>(
        &self,
        settings: &CacheSettings,
        store: &Arc<dyn PageStore>,
        make_fetcher: F,
    ) -> Result<Arc<PaginatedCache<T, P>>>
    where
        F: FnOnce() -> X,
        X: Fetcher<T, P> + 'static,
    {
        let mut bound = self.lock();

        if let Some(existing) = bound.as_ref() {
            if let Some(field) = changed_field(existing, settings, store) {
                match self.mode {
                    InvariantMode::Strict => return Err(PagerError::ConfigChanged { field }),
                    InvariantMode::Relaxed => warn!(
                        "Ignoring change to {} for cache {}",
                        field, existing.settings.cache_key
                    ),
                }
            }
            return Ok(existing.cache.clone());
        }

        let cache = Arc::new(
            PaginatedCache::builder(settings.cache_key.clone(), make_fetcher())
                .settings(settings)
                .store(store.clone())
                .build(),
        );
        *bound = Some(Bound {
            settings: settings.clone(),
            store: store.clone(),
            cache: cache.clone(),
        });
        Ok(cache)
    }
}

fn changed_field<T, P>(
    bound: &Bound<T, P>,
    settings: &CacheSettings,
    store: &Arc<dyn PageStore>,
) -> Option<&'static str> {
    if bound.settings.cache_key != settings.cache_key {
        Some("cache_key")
    } else if bound.settings.max_page_lifetime_ms != settings.max_page_lifetime_ms {
        Some("max_page_lifetime")
    } else if bound.settings.discard_stale_responses != settings.discard_stale_responses {
        Some("discard_stale_responses")
    } else if !same_store(&bound.store, store) {
        Some("store")
    } else {
        None
    }
}

/// Identity comparison on the store allocation, ignoring vtables.
fn same_store(a: &Arc<dyn PageStore>, b: &Arc<dyn PageStore>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
