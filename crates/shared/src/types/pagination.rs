//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Creates a page request, clamping out-of-range values.
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Returns the 0-indexed page number for `Paginator::fetch_page`.
    #[must_use]
    pub fn page_index(&self) -> u64 {
        u64::from(self.page.saturating_sub(1))
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page.clamp(1, MAX_PER_PAGE))
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if total == 0 || per_page == 0 {
            1
        } else {
            total.div_ceil(u64::from(per_page))
        };

        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }

    /// Maps the items while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 20);
        assert_eq!(req.page_index(), 0);
        assert_eq!(req.limit(), 20);
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(0, 1000);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, MAX_PER_PAGE);

        let req = PageRequest::new(3, 0);
        assert_eq!(req.per_page, 1);
        assert_eq!(req.page_index(), 2);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(PageResponse::new(vec![1], 1, 20, 0).meta.total_pages, 1);
        assert_eq!(PageResponse::new(vec![1], 1, 20, 20).meta.total_pages, 1);
        assert_eq!(PageResponse::new(vec![1], 1, 20, 21).meta.total_pages, 2);
    }

    #[test]
    fn test_map_keeps_meta() {
        let page = PageResponse::new(vec![1, 2], 2, 2, 5).map(|n| n * 10);
        assert_eq!(page.data, vec![10, 20]);
        assert_eq!(page.meta.page, 2);
        assert_eq!(page.meta.total_pages, 3);
    }
}
