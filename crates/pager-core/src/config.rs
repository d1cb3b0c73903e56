//! Centralized configuration for the pager.
//!
//! Constants for pagination defaults and storage, plus the serde-loadable
//! settings a host uses to describe one logical cache.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pagination defaults.
pub struct PagerConfig;

impl PagerConfig {
    pub const FIRST_PAGE: u32 = 1;
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 1_000;
}

/// Storage-related configuration.
pub struct StoreConfig;

impl StoreConfig {
    pub const SQLITE_TABLE: &'static str = "cached_pages";
    pub const SQLITE_FILE_NAME: &'static str = "pages.db";
}

/// How strictly construction-parameter drift is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantMode {
    /// Drift is an error.
    Strict,
    /// Drift is logged and the original configuration is kept.
    Relaxed,
}

impl InvariantMode {
    /// Strict in debug builds, relaxed in release builds.
    pub fn from_build() -> Self {
        if cfg!(debug_assertions) {
            InvariantMode::Strict
        } else {
            InvariantMode::Relaxed
        }
    }
}

impl Default for InvariantMode {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Settings for one logical paginated cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheSettings {
    /// Namespace separating this cache's entries in a shared store.
    pub cache_key: String,
    /// Page lifetime in milliseconds. `None` caches forever, `0` never reuses.
    #[serde(default)]
    pub max_page_lifetime_ms: Option<u64>,
    /// Ignore completions that are not from the most recent request.
    #[serde(default)]
    pub discard_stale_responses: bool,
}

impl CacheSettings {
    /// Settings with an unbounded page lifetime.
    pub fn new(cache_key: impl Into<String>) -> Self {
        Self {
            cache_key: cache_key.into(),
            max_page_lifetime_ms: None,
            discard_stale_responses: false,
        }
    }

    /// Set the page lifetime.
    pub fn with_max_page_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_page_lifetime_ms = Some(u64::try_from(lifetime.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set whether stale completions are discarded.
    pub fn with_discard_stale_responses(mut self, discard: bool) -> Self {
        self.discard_stale_responses = discard;
        self
    }

    pub fn max_page_lifetime(&self) -> Option<Duration> {
        self.max_page_lifetime_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_json() {
        let settings: CacheSettings =
            serde_json::from_str(r#"{"cache_key":"sessions","max_page_lifetime_ms":1500}"#)
                .unwrap();
        assert_eq!(settings.cache_key, "sessions");
        assert_eq!(settings.max_page_lifetime(), Some(Duration::from_millis(1500)));
        assert!(!settings.discard_stale_responses);
    }

    #[test]
    fn test_settings_default_lifetime_is_unbounded() {
        let settings: CacheSettings = serde_json::from_str(r#"{"cache_key":"templates"}"#).unwrap();
        assert_eq!(settings.max_page_lifetime(), None);
    }

    #[test]
    fn test_invariant_mode_tracks_build() {
        let expected = if cfg!(debug_assertions) {
            InvariantMode::Strict
        } else {
            InvariantMode::Relaxed
        };
        assert_eq!(InvariantMode::default(), expected);
    }

    #[test]
    fn test_page_size_bounds_are_consistent() {
        assert!(PagerConfig::DEFAULT_PAGE_SIZE <= PagerConfig::MAX_PAGE_SIZE);
        assert!(PagerConfig::FIRST_PAGE >= 1);
    }

    #[test]
    fn test_huge_lifetime_saturates() {
        let settings = CacheSettings::new("sessions").with_max_page_lifetime(Duration::MAX);
        assert_eq!(settings.max_page_lifetime_ms, Some(u64::MAX));
        assert_eq!(settings.max_page_lifetime(), Some(Duration::from_millis(u64::MAX)));
    }
}
