//! Observable state cells.
//!
//! Each published value lives in its own cell so consumers can subscribe to
//! just the fields they render. Cells are thin wrappers over
//! `tokio::sync::watch`: receivers are notified as soon as a value is set.

use tokio::sync::watch;

/// A single observable value.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Subscribe to changes. The receiver starts with the current value seen.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Observable<T> {
    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
