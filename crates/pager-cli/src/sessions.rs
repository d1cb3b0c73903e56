//! Simulated practice-session backend.
//!
//! Stands in for a remote list endpoint: a fixed set of sessions, an optional
//! instrument filter and a configurable response latency.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use pager_core::{FetchHandle, Fetcher, PageResult, PaginationArgs};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const INSTRUMENTS: [&str; 3] = ["piano", "violin", "guitar"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    pub id: u64,
    pub instrument: String,
    pub minutes: u32,
    pub started_at: DateTime<Utc>,
}

/// Filter applied by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
}

impl SessionFilter {
    pub fn instrument(name: impl Into<String>) -> Self {
        Self {
            instrument: Some(name.into()),
        }
    }

    fn matches(&self, session: &PracticeSession) -> bool {
        self.instrument
            .as_deref()
            .map_or(true, |name| session.instrument == name)
    }
}

pub struct SessionBackend {
    sessions: Arc<Vec<PracticeSession>>,
    latency: Duration,
    requests: AtomicUsize,
}

impl SessionBackend {
    /// A backend holding `count` generated sessions.
    pub fn generate(count: u64, latency: Duration) -> Self {
        let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single().unwrap_or_default();
        let sessions = (0..count)
            .map(|i| PracticeSession {
                id: i + 1,
                instrument: INSTRUMENTS[(i % INSTRUMENTS.len() as u64) as usize].to_string(),
                minutes: 15 + ((i * 7) % 46) as u32,
                started_at: epoch + ChronoDuration::hours(i as i64 * 5),
            })
            .collect();

        Self {
            sessions: Arc::new(sessions),
            latency,
            requests: AtomicUsize::new(0),
        }
    }

    /// Number of fetches the backend has served or started.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn select_page(
    sessions: &[PracticeSession],
    args: PaginationArgs,
    filter: Option<&SessionFilter>,
) -> PageResult<PracticeSession> {
    let matching: Vec<&PracticeSession> = sessions
        .iter()
        .filter(|s| filter.map_or(true, |f| f.matches(s)))
        .collect();

    let start = (args.page as usize - 1).saturating_mul(args.page_size as usize);
    let items = matching
        .iter()
        .skip(start)
        .take(args.page_size as usize)
        .map(|s| (*s).clone())
        .collect();

    PageResult::new(items, matching.len() as u64, args)
}

impl Fetcher<PracticeSession, SessionFilter> for SessionBackend {
    fn fetch(
        &self,
        args: PaginationArgs,
        params: Option<&SessionFilter>,
        force_clear_cache: bool,
    ) -> FetchHandle<PracticeSession> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Backend request #{} for page {} (force: {})",
            request, args.page, force_clear_cache
        );

        let sessions = self.sessions.clone();
        let filter = params.cloned();
        let latency = self.latency;
        FetchHandle::abortable(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            Ok(select_page(&sessions, args, filter.as_ref()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_cycles_instruments() {
        let backend = SessionBackend::generate(6, Duration::ZERO);
        let instruments: Vec<&str> = backend
            .sessions
            .iter()
            .map(|s| s.instrument.as_str())
            .collect();
        assert_eq!(
            instruments,
            vec!["piano", "violin", "guitar", "piano", "violin", "guitar"]
        );
    }

    #[test]
    fn test_select_page_short_last_page() {
        let backend = SessionBackend::generate(23, Duration::ZERO);
        let page = select_page(&backend.sessions, PaginationArgs::new(3, 10), None);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_items, 23);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items[0].id, 21);
    }

    #[test]
    fn test_select_page_with_filter() {
        let backend = SessionBackend::generate(30, Duration::ZERO);
        let filter = SessionFilter::instrument("violin");
        let page = select_page(&backend.sessions, PaginationArgs::new(1, 4), Some(&filter));
        assert_eq!(page.total_items, 10);
        assert!(page.items.iter().all(|s| s.instrument == "violin"));
    }

    #[test]
    fn test_select_page_past_end_is_empty() {
        let backend = SessionBackend::generate(5, Duration::ZERO);
        let page = select_page(&backend.sessions, PaginationArgs::new(4, 5), None);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_fetch_counts_requests() {
        let backend = SessionBackend::generate(12, Duration::ZERO);
        let handle = backend.fetch(PaginationArgs::new(2, 5), None, false);
        let page = handle.response.await.unwrap();
        assert_eq!(page.current_page, 2);
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_abort_rejects() {
        let backend = SessionBackend::generate(12, Duration::from_secs(60));
        let handle = backend.fetch(PaginationArgs::new(1, 5), None, false);
        assert!(handle.abort.abort());
        let err = handle.response.await.unwrap_err();
        assert!(err.is_abort());
    }
}
