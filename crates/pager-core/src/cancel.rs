//! Cooperative cancellation for in-flight page fetches.
//!
//! An `AbortSignal` is shared between the abort closure handed to the cache
//! and the fetch future. Cancelling it wakes every waiter so the fetch can
//! reject with [`PagerError::Aborted`](crate::PagerError::Aborted).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct SignalInner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cancellation token for cooperative cancellation of a page fetch.
///
/// Clones share state. When `cancel()` is called on any clone, all clones
/// observe the cancellation and pending `cancelled()` futures complete.
///
/// # Example
///
/// ```
/// use pager_core::cancel::AbortSignal;
///
/// let signal = AbortSignal::new();
/// let observer = signal.clone();
///
/// assert!(signal.cancel());
/// assert!(observer.is_cancelled());
/// // A second cancel reports that nothing changed.
/// assert!(!signal.cancel());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    inner: Arc<SignalInner>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// Returns `true` if this call moved the signal into the cancelled state.
    pub fn cancel(&self) -> bool {
        let first = !self.inner.cancelled.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until cancellation is requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel is not missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Check cancellation and return an error if cancelled.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            Err(crate::PagerError::Aborted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_signal_not_cancelled() {
        let signal = AbortSignal::new();
        assert!(!signal.is_cancelled());
        assert!(signal.check().is_ok());
    }

    #[test]
    fn test_cancel_is_reported_once() {
        let signal = AbortSignal::new();
        assert!(signal.cancel());
        assert!(!signal.cancel());
        assert!(signal.is_cancelled());
        assert!(signal.check().unwrap_err().is_abort());
    }

    #[test]
    fn test_clone_shares_state() {
        let a = AbortSignal::new();
        let b = a.clone();
        b.cancel();
        assert!(a.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let signal = AbortSignal::new();
        let waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        tokio::task::yield_now().await;
        signal.cancel();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_cancelled() {
        let signal = AbortSignal::new();
        signal.cancel();
        signal.cancelled().await;
    }
}
