//! Pagination arguments and page results.

use crate::config::PagerConfig;
use crate::error::{PagerError, Result};
use serde::{Deserialize, Serialize};

/// Which page to fetch and how large pages are. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationArgs {
    pub page: u32,
    pub page_size: u32,
}

impl PaginationArgs {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Reject a page before the first, or a page size outside
    /// `1..=PagerConfig::MAX_PAGE_SIZE`.
    pub fn validate(&self) -> Result<()> {
        if self.page < PagerConfig::FIRST_PAGE {
            return Err(PagerError::validation(
                "page",
                format!("must be at least {}", PagerConfig::FIRST_PAGE),
            ));
        }
        if self.page_size < 1 {
            return Err(PagerError::validation("page_size", "must be at least 1"));
        }
        if self.page_size > PagerConfig::MAX_PAGE_SIZE {
            return Err(PagerError::validation(
                "page_size",
                format!("must be at most {}", PagerConfig::MAX_PAGE_SIZE),
            ));
        }
        Ok(())
    }

    /// The same page size at a different page.
    pub fn with_page(self, page: u32) -> Self {
        Self { page, ..self }
    }
}

/// One page of items plus pagination metadata.
///
/// The default value is the empty, zeroed page published before any load
/// completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub page_size: u32,
    pub current_page: u32,
    pub total_pages: u32,
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            page_size: 0,
            current_page: 0,
            total_pages: 0,
        }
    }
}

impl<T> PageResult<T> {
    /// Build a page, deriving `total_pages` from the item total.
    pub fn new(items: Vec<T>, total_items: u64, args: PaginationArgs) -> Self {
        let total_pages = if args.page_size == 0 {
            0
        } else {
            total_items.div_ceil(u64::from(args.page_size)) as u32
        };
        Self {
            items,
            total_items,
            page_size: args.page_size,
            current_page: args.page,
            total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next_page(&self) -> bool {
        self.total_pages > 0 && self.current_page < self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.total_pages > 0 && self.current_page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero() {
        assert!(PaginationArgs::new(1, 10).validate().is_ok());
        assert!(matches!(
            PaginationArgs::new(0, 10).validate(),
            Err(PagerError::Validation { field, .. }) if field == "page"
        ));
        assert!(matches!(
            PaginationArgs::new(1, 0).validate(),
            Err(PagerError::Validation { field, .. }) if field == "page_size"
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_page() {
        assert!(PaginationArgs::new(1, PagerConfig::MAX_PAGE_SIZE).validate().is_ok());
        assert!(matches!(
            PaginationArgs::new(1, PagerConfig::MAX_PAGE_SIZE + 1).validate(),
            Err(PagerError::Validation { field, .. }) if field == "page_size"
        ));
    }

    #[test]
    fn test_new_derives_total_pages() {
        let page = PageResult::new(vec![1, 2, 3], 23, PaginationArgs::new(3, 10));
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert!(!page.has_next_page());
        assert!(page.has_previous_page());
    }

    #[test]
    fn test_default_is_empty_page() {
        let page: PageResult<String> = PageResult::default();
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page());
        assert!(!page.has_previous_page());
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let page = PageResult::new(vec!["a"], 1, PaginationArgs::new(1, 5));
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["totalItems"], 1);
        assert_eq!(value["currentPage"], 1);
        assert_eq!(value["totalPages"], 1);
    }
}
