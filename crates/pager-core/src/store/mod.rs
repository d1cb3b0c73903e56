//! Backing stores for cached pages.
//!
//! A store maps [`CacheKey`](crate::CacheKey) to [`CachedPage`]. Stores are
//! injected into caches so several caches can share one store, each under its
//! own namespace, or stay isolated (one store per cache, or per test).

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryPageStore;
pub use sqlite::SqlitePageStore;
pub use traits::{CachedPage, PageStore};
