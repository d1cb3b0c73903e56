//! The paginated fetch-and-cache layer.
//!
//! A [`PaginatedCache`] sits between list views and a [`Fetcher`]. It serves
//! live pages from its store, tracks the one in-flight request, and publishes
//! `data`, `is_loading`, `error` and `pending_request` as separate observable
//! cells.
//!
//! Overlapping loads are allowed. By default whichever completion settles last
//! decides what is published ("last write wins"); there is no queue. Enable
//! `discard_stale_responses` to publish only the most recently issued load.

mod binding;
mod builder;
mod request;

pub use binding::CacheBinding;
pub use builder::PaginatedCacheBuilder;
pub use request::{LoadOutcome, PendingRequest};

use crate::error::{PagerError, Result};
use crate::fetcher::Fetcher;
use crate::key::CacheKey;
use crate::observable::Observable;
use crate::page::{PageResult, PaginationArgs};
use crate::store::{CachedPage, PageStore};
use chrono::Utc;
use request::{RequestRef, RequestState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Paginated cache over a fetcher and a page store.
///
/// `T` is the item type, `P` the params (filters, sort) type. Params are
/// compared by value through their JSON form.
pub struct PaginatedCache<T, P = serde_json::Value> {
    cache_key: String,
    max_page_lifetime: Option<Duration>,
    discard_stale_responses: bool,
    store: Arc<dyn PageStore>,
    fetcher: Box<dyn Fetcher<T, P>>,
    requests: Mutex<RequestState<P>>,
    data: Observable<PageResult<T>>,
    is_loading: Observable<bool>,
    error: Observable<Option<Arc<PagerError>>>,
    pending_request: Observable<Option<PendingRequest<P>>>,
}

impl<T, P> PaginatedCache<T, P>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    P: Serialize + Clone + Send + Sync + 'static,
{
    /// Start building a cache for namespace `cache_key`.
    pub fn builder(
        cache_key: impl Into<String>,
        fetcher: impl Fetcher<T, P> + 'static,
    ) -> PaginatedCacheBuilder<T, P> {
        PaginatedCacheBuilder::new(cache_key, fetcher)
    }

    /// Load one page, from the store when a live entry exists.
    ///
    /// Fetch failures are published to `error` and reported as
    /// [`LoadOutcome::Failed`]; `Err` is reserved for invalid arguments and
    /// params that cannot be serialized.
    pub async fn load_page(
        &self,
        args: PaginationArgs,
        params: Option<P>,
        force_clear_cache: bool,
    ) -> Result<LoadOutcome> {
        args.validate()?;
        let key = CacheKey::new(&self.cache_key, args, params.as_ref())?;

        if !force_clear_cache && self.max_page_lifetime != Some(Duration::ZERO) {
            if let Some(page) = self.lookup(&key) {
                debug!("Page cache hit for {}", key);
                let mut requests = self.lock_requests();
                requests.issue();
                requests.published = Some(RequestRef { args, params });
                self.data.set(page);
                self.error.set(None);
                self.is_loading.set(false);
                return Ok(LoadOutcome::CacheHit);
            }
        }

        debug!("Fetching page {} (force: {})", key, force_clear_cache);
        self.is_loading.set(true);
        let handle = self.fetcher.fetch(args, params.as_ref(), force_clear_cache);

        let id = {
            let mut requests = self.lock_requests();
            let id = requests.issue();
            let pending = PendingRequest {
                id,
                pagination_args: args,
                params: params.clone(),
                abort: handle.abort.clone(),
            };
            requests.pending = Some(pending.clone());
            self.pending_request.set(Some(pending));
            id
        };

        let mut in_flight = InFlight {
            cache: self,
            id,
            armed: true,
        };
        let result = handle.response.await;
        in_flight.armed = false;

        if let Ok(page) = &result {
            self.store_page(&key, page);
        }

        let mut requests = self.lock_requests();
        if requests.clear_pending(id) {
            self.pending_request.set(None);
        }
        let still_pending = requests.pending.is_some();

        if self.discard_stale_responses && !requests.is_latest(id) {
            debug!("Discarding stale response for {}", key);
            self.is_loading.set(still_pending);
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                requests.published = Some(RequestRef { args, params });
                self.data.set(page);
                self.error.set(None);
                self.is_loading.set(still_pending);
                Ok(LoadOutcome::Fetched)
            }
            Err(err) => {
                if err.is_abort() {
                    debug!("Fetch for {} was aborted", key);
                } else {
                    warn!("Fetch for {} failed: {}", key, err);
                }
                self.error.set(Some(Arc::new(err)));
                self.is_loading.set(still_pending);
                Ok(LoadOutcome::Failed)
            }
        }
    }

    /// Load the page `delta` pages away from the current one.
    ///
    /// The reference is the in-flight request when there is one, otherwise
    /// the published page. Its page size and params are reused. Targets
    /// outside `1..=total_pages`, or any target while `total_pages` is zero,
    /// are a no-op.
    pub async fn load_adjacent_page(
        &self,
        delta: i64,
        force_clear_cache: bool,
    ) -> Result<LoadOutcome> {
        let (args, params) = {
            let requests = self.lock_requests();
            let (current_page, published_size, total_pages) =
                self.data.with(|d| (d.current_page, d.page_size, d.total_pages));

            if total_pages == 0 {
                debug!("Adjacent load skipped for {}: no pages", self.cache_key);
                return Ok(LoadOutcome::OutOfBounds);
            }

            let (reference, params) = match (&requests.pending, &requests.published) {
                (Some(pending), _) => (pending.pagination_args, pending.params.clone()),
                (None, Some(published)) => (
                    published.args.with_page(current_page),
                    published.params.clone(),
                ),
                (None, None) => (PaginationArgs::new(current_page, published_size), None),
            };

            let target = i64::from(reference.page)
                .checked_add(delta)
                .filter(|target| (1..=i64::from(total_pages)).contains(target))
                .and_then(|target| u32::try_from(target).ok());
            let Some(target) = target else {
                debug!(
                    "Adjacent load skipped for {}: page {} {:+} outside 1..={}",
                    self.cache_key, reference.page, delta, total_pages
                );
                return Ok(LoadOutcome::OutOfBounds);
            };

            (reference.with_page(target), params)
        };

        self.load_page(args, params, force_clear_cache).await
    }

    /// Abort the tracked request.
    ///
    /// Returns `false` when nothing is pending, otherwise the abort callback's
    /// result. The aborted response may still settle later; it is handled
    /// like any other completion.
    pub fn abort_request(&self) -> bool {
        let pending = {
            let mut requests = self.lock_requests();
            let pending = requests.pending.take();
            if pending.is_some() {
                self.pending_request.set(None);
                self.is_loading.set(false);
            }
            pending
        };

        match pending {
            Some(pending) => {
                info!(
                    "Aborting request {} for {} page {}",
                    pending.id, self.cache_key, pending.pagination_args.page
                );
                pending.abort.abort()
            }
            None => false,
        }
    }

    /// Remove every stored page in this cache's namespace.
    pub fn invalidate(&self) -> Result<usize> {
        let removed = self.store.invalidate_namespace(&self.cache_key)?;
        debug!("Invalidated {} pages for {}", removed, self.cache_key);
        Ok(removed)
    }

    /// Remove the stored page for one set of arguments.
    pub fn invalidate_page(&self, args: PaginationArgs, params: Option<&P>) -> Result<bool> {
        let key = CacheKey::new(&self.cache_key, args, params)?;
        self.store.remove(&key)
    }

    /// Remove stored pages older than the page lifetime.
    ///
    /// With an unbounded lifetime nothing ever expires.
    pub fn purge_expired(&self) -> Result<usize> {
        match self.max_page_lifetime {
            Some(lifetime) => self.store.remove_expired(&self.cache_key, lifetime),
            None => Ok(0),
        }
    }

    /// Number of pages stored under this cache's namespace.
    pub fn cached_page_count(&self) -> Result<usize> {
        self.store.namespace_len(&self.cache_key)
    }

    fn lookup(&self, key: &CacheKey) -> Option<PageResult<T>> {
        let cached = match self.store.get(key) {
            Ok(Some(cached)) => cached,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cached page {}: {}", key, e);
                return None;
            }
        };

        if !cached.is_live(self.max_page_lifetime, Utc::now()) {
            debug!("Cached page {} expired", key);
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove expired page {}: {}", key, e);
            }
            return None;
        }

        match serde_json::from_value(cached.value) {
            Ok(page) => Some(page),
            Err(e) => {
                warn!("Ignoring undecodable cached page {}: {}", key, e);
                None
            }
        }
    }

    fn store_page(&self, key: &CacheKey, page: &PageResult<T>) {
        let value = match serde_json::to_value(page) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize page {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.insert(key, CachedPage::new(value)) {
            warn!("Failed to store page {}: {}", key, e);
        }
    }
}

impl<T, P> PaginatedCache<T, P> {
    /// Namespace of this cache's entries in the store.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Maximum age of a served page; `None` is unbounded.
    pub fn max_page_lifetime(&self) -> Option<Duration> {
        self.max_page_lifetime
    }

    /// Whether completions of superseded loads are dropped.
    pub fn discards_stale_responses(&self) -> bool {
        self.discard_stale_responses
    }

    /// The backing store, possibly shared with other caches.
    pub fn store(&self) -> &Arc<dyn PageStore> {
        &self.store
    }

    fn lock_requests(&self) -> MutexGuard<'_, RequestState<P>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone, P: Clone> PaginatedCache<T, P> {
    /// The last published page, or the empty page.
    pub fn data(&self) -> PageResult<T> {
        self.data.get()
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading.get()
    }

    /// The last fetch failure, cleared by the next successful load.
    pub fn error(&self) -> Option<Arc<PagerError>> {
        self.error.get()
    }

    /// The tracked in-flight request.
    pub fn pending_request(&self) -> Option<PendingRequest<P>> {
        self.pending_request.get()
    }

    /// Subscribe to published pages.
    pub fn subscribe_data(&self) -> watch::Receiver<PageResult<T>> {
        self.data.subscribe()
    }

    /// Subscribe to loading transitions.
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.is_loading.subscribe()
    }

    /// Subscribe to published errors.
    pub fn subscribe_error(&self) -> watch::Receiver<Option<Arc<PagerError>>> {
        self.error.subscribe()
    }

    /// Subscribe to the pending-request slot.
    pub fn subscribe_pending(&self) -> watch::Receiver<Option<PendingRequest<P>>> {
        self.pending_request.subscribe()
    }
}

/// Clears the pending slot if a `load_page` future is dropped mid-flight.
struct InFlight<'a, T, P> {
    cache: &'a PaginatedCache<T, P>,
    id: u64,
    armed: bool,
}

impl<T, P> Drop for InFlight<'_, T, P> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut requests = self.cache.lock_requests();
        if requests.clear_pending(self.id) {
            debug!("Load for {} dropped before completion", self.cache.cache_key);
            self.cache.pending_request.set(None);
            self.cache.is_loading.set(false);
        }
    }
}
