//! Pager Core - paginated fetching and caching for list views.
//!
//! This crate mediates between views that page through lists (practice
//! templates, sessions, daily instances) and the asynchronous operations
//! that fetch those pages. It caches pages per namespace, pagination and
//! params, tracks the in-flight request for cancellation and relative
//! navigation, and publishes its state through observable cells.
//!
//! # Example
//!
//! ```rust,ignore
//! use pager_core::{fetcher_fn, FetchHandle, PageResult, PaginatedCache, PaginationArgs};
//!
//! let cache = PaginatedCache::builder("practice-sessions", fetcher_fn(
//!     |args: PaginationArgs, params: Option<&serde_json::Value>, _force: bool| {
//!         FetchHandle::abortable(load_sessions(args, params.cloned()))
//!     },
//! ))
//! .build();
//!
//! cache.load_page(PaginationArgs::new(1, 20), None, false).await?;
//! cache.load_adjacent_page(1, false).await?;
//! println!("{} sessions on page {}", cache.data().items.len(), cache.data().current_page);
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod key;
pub mod observable;
pub mod page;
pub mod paginated;
pub mod store;

// Re-export commonly used types
pub use cancel::AbortSignal;
pub use config::{CacheSettings, InvariantMode, PagerConfig};
pub use error::{PagerError, Result};
pub use fetcher::{fetcher_fn, AbortHandle, FetchHandle, Fetcher};
pub use key::CacheKey;
pub use observable::Observable;
pub use page::{PageResult, PaginationArgs};
pub use paginated::{
    CacheBinding, LoadOutcome, PaginatedCache, PaginatedCacheBuilder, PendingRequest,
};
pub use store::{CachedPage, MemoryPageStore, PageStore, SqlitePageStore};
