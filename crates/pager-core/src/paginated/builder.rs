//! Builder for configuring a `PaginatedCache`.

use super::request::RequestState;
use super::PaginatedCache;
use crate::config::CacheSettings;
use crate::fetcher::Fetcher;
use crate::observable::Observable;
use crate::store::{MemoryPageStore, PageStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Builder for configuring a [`PaginatedCache`].
///
/// Construction parameters are fixed once built; there are no setters on the
/// cache itself.
///
/// # Example
///
/// ```rust,ignore
/// let cache = PaginatedCache::builder("practice-sessions", fetcher)
///     .max_page_lifetime(Duration::from_secs(30))
///     .store(shared_store.clone())
///     .build();
/// ```
pub struct PaginatedCacheBuilder<T, P> {
    cache_key: String,
    fetcher: Box<dyn Fetcher<T, P>>,
    max_page_lifetime: Option<Duration>,
    store: Option<Arc<dyn PageStore>>,
    discard_stale_responses: bool,
}

impl<T, P> PaginatedCacheBuilder<T, P> {
    pub fn new(cache_key: impl Into<String>, fetcher: impl Fetcher<T, P> + 'static) -> Self {
        Self {
            cache_key: cache_key.into(),
            fetcher: Box::new(fetcher),
            max_page_lifetime: None,
            store: None,
            discard_stale_responses: false,
        }
    }

    /// Maximum age of a page served from the store.
    ///
    /// `Duration::ZERO` disables reuse entirely. Default: unbounded.
    pub fn max_page_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_page_lifetime = Some(lifetime);
        self
    }

    /// Backing store, possibly shared with other caches.
    ///
    /// Default: a fresh [`MemoryPageStore`] owned by this cache.
    pub fn store(mut self, store: Arc<dyn PageStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Publish only the most recently issued load.
    ///
    /// Default: `false` (last completion wins).
    pub fn discard_stale_responses(mut self, discard: bool) -> Self {
        self.discard_stale_responses = discard;
        self
    }

    /// Apply namespace, lifetime and staleness policy from settings.
    pub fn settings(mut self, settings: &CacheSettings) -> Self {
        self.cache_key = settings.cache_key.clone();
        self.max_page_lifetime = settings.max_page_lifetime();
        self.discard_stale_responses = settings.discard_stale_responses;
        self
    }

    pub fn build(self) -> PaginatedCache<T, P> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryPageStore::new()));

        PaginatedCache {
            cache_key: self.cache_key,
            max_page_lifetime: self.max_page_lifetime,
            discard_stale_responses: self.discard_stale_responses,
            store,
            fetcher: self.fetcher,
            requests: Mutex::new(RequestState::default()),
            data: Observable::default(),
            is_loading: Observable::new(false),
            error: Observable::new(None),
            pending_request: Observable::new(None),
        }
    }
}
