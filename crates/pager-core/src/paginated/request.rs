//! Request bookkeeping: the pending-request slot and load outcomes.

use crate::fetcher::AbortHandle;
use crate::page::PaginationArgs;

/// The fetch currently tracked by a cache.
///
/// Only one is tracked at a time. Starting another fetch replaces it without
/// cancelling it.
#[derive(Debug, Clone)]
pub struct PendingRequest<P> {
    /// Sequence number of the load that started this fetch.
    pub id: u64,
    pub pagination_args: PaginationArgs,
    pub params: Option<P>,
    pub(crate) abort: AbortHandle,
}

/// What a load call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Served from a live cached page; the fetcher was not called.
    CacheHit,
    /// Fetched and published a new page.
    Fetched,
    /// The fetch rejected; the error was published and data left as is.
    Failed,
    /// A newer load was issued first, so this completion was not published.
    Superseded,
    /// Adjacent navigation fell outside the known pages; nothing happened.
    OutOfBounds,
}

/// Pagination and params behind the currently published page.
#[derive(Debug, Clone)]
pub(crate) struct RequestRef<P> {
    pub(crate) args: PaginationArgs,
    pub(crate) params: Option<P>,
}

/// Mutable request state guarded by the cache's mutex.
#[derive(Debug)]
pub(crate) struct RequestState<P> {
    pub(crate) pending: Option<PendingRequest<P>>,
    pub(crate) published: Option<RequestRef<P>>,
    latest_issued: u64,
}

impl<P> Default for RequestState<P> {
    fn default() -> Self {
        Self {
            pending: None,
            published: None,
            latest_issued: 0,
        }
    }
}

impl<P> RequestState<P> {
    /// Allocate the next load sequence number.
    pub(crate) fn issue(&mut self) -> u64 {
        self.latest_issued += 1;
        self.latest_issued
    }

    pub(crate) fn is_latest(&self, id: u64) -> bool {
        self.latest_issued == id
    }

    /// Clear the slot if it still tracks request `id`.
    pub(crate) fn clear_pending(&mut self, id: u64) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.id == id) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(id: u64) -> PendingRequest<()> {
        PendingRequest {
            id,
            pagination_args: PaginationArgs::new(1, 10),
            params: None,
            abort: AbortHandle::noop(),
        }
    }

    #[test]
    fn test_issue_is_monotonic() {
        let mut state: RequestState<()> = RequestState::default();
        let a = state.issue();
        let b = state.issue();
        assert!(b > a);
        assert!(state.is_latest(b));
        assert!(!state.is_latest(a));
    }

    #[test]
    fn test_clear_pending_ignores_other_ids() {
        let mut state = RequestState::default();
        state.pending = Some(pending(2));

        assert!(!state.clear_pending(1));
        assert!(state.pending.is_some());

        assert!(state.clear_pending(2));
        assert!(state.pending.is_none());
    }
}
