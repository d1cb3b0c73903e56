//! The fetcher contract consumed by [`PaginatedCache`](crate::PaginatedCache).
//!
//! A fetcher starts one page request and hands back a [`FetchHandle`]: an
//! abort callback plus the response future. The cache awaits the response
//! once per fetching load and calls abort only from `abort_request`.

use crate::cancel::AbortSignal;
use crate::error::{PagerError, Result};
use crate::page::{PageResult, PaginationArgs};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Callback that cancels an in-flight fetch.
///
/// Returns whether anything was actually cancelled.
#[derive(Clone)]
pub struct AbortHandle(Arc<dyn Fn() -> bool + Send + Sync>);

impl AbortHandle {
    pub fn new(abort: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(abort))
    }

    /// A handle for fetches that cannot be cancelled.
    pub fn noop() -> Self {
        Self::new(|| false)
    }

    pub fn abort(&self) -> bool {
        (self.0)()
    }
}

impl From<AbortSignal> for AbortHandle {
    fn from(signal: AbortSignal) -> Self {
        Self::new(move || signal.cancel())
    }
}

impl fmt::Debug for AbortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AbortHandle")
    }
}

/// A started fetch: its abort callback and its response.
pub struct FetchHandle<T> {
    pub abort: AbortHandle,
    pub response: BoxFuture<'static, Result<PageResult<T>>>,
}

impl<T: Send + 'static> FetchHandle<T> {
    pub fn new<F>(abort: AbortHandle, response: F) -> Self
    where
        F: Future<Output = Result<PageResult<T>>> + Send + 'static,
    {
        Self {
            abort,
            response: response.boxed(),
        }
    }

    /// A fetch that has already completed and cannot be aborted.
    pub fn ready(result: Result<PageResult<T>>) -> Self {
        Self::new(AbortHandle::noop(), futures::future::ready(result))
    }

    /// Wrap `response` so aborting makes it reject with `PagerError::Aborted`.
    ///
    /// The first abort returns `true`; later aborts return `false`.
    pub fn abortable<F>(response: F) -> Self
    where
        F: Future<Output = Result<PageResult<T>>> + Send + 'static,
    {
        let signal = AbortSignal::new();
        let watcher = signal.clone();
        let response = async move {
            tokio::select! {
                biased;
                _ = watcher.cancelled() => Err(PagerError::Aborted),
                result = response => result,
            }
        };
        Self::new(AbortHandle::from(signal), response)
    }
}

impl<T> fmt::Debug for FetchHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchHandle").finish_non_exhaustive()
    }
}

/// Starts page requests.
///
/// `params` carries caller filters and sort order; `force_clear_cache` is
/// forwarded so fetchers can bypass their own caches too.
pub trait Fetcher<T, P>: Send + Sync {
    fn fetch(&self, args: PaginationArgs, params: Option<&P>, force_clear_cache: bool)
        -> FetchHandle<T>;
}

impl<T, P, X> Fetcher<T, P> for Arc<X>
where
    X: Fetcher<T, P> + ?Sized,
{
    fn fetch(
        &self,
        args: PaginationArgs,
        params: Option<&P>,
        force_clear_cache: bool,
    ) -> FetchHandle<T> {
        (**self).fetch(args, params, force_clear_cache)
    }
}

/// Fetcher built from a closure. See [`fetcher_fn`].
pub struct FnFetcher<F>(F);

/// Adapt a closure into a [`Fetcher`].
pub fn fetcher_fn<T, P, F>(f: F) -> FnFetcher<F>
where
    F: Fn(PaginationArgs, Option<&P>, bool) -> FetchHandle<T> + Send + Sync,
{
    FnFetcher(f)
}

impl<T, P, F> Fetcher<T, P> for FnFetcher<F>
where
    F: Fn(PaginationArgs, Option<&P>, bool) -> FetchHandle<T> + Send + Sync,
{
    fn fetch(
        &self,
        args: PaginationArgs,
        params: Option<&P>,
        force_clear_cache: bool,
    ) -> FetchHandle<T> {
        (self.0)(args, params, force_clear_cache)
    }
}
