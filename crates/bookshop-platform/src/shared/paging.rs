//! Page-window computation for catalog listings.
//!
//! Requests carry a desired page, a page size, and a sort order; the window
//! clamps all of them against the actual collection size so that a handler
//! can never be asked to skip past the data or to return unbounded results.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Smallest allowed page size; undersized or missing requests clamp to this.
pub const MIN_PER_PAGE: u64 = 5;
/// Largest allowed page size; oversized requests clamp to this.
pub const MAX_PER_PAGE: u64 = 30;
/// First page number.
pub const MIN_PAGE: u64 = 1;

/// Sort key for catalog listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Price,
    Title,
    Author,
}

/// Listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "snake_case")]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Requested page, 1-based
    #[serde(default = "default_page")]
    pub page: u64,

    /// Requested items per page
    #[serde(default = "default_per_page")]
    pub per_page: u64,

    /// Sort ascending instead of the default descending
    #[serde(default)]
    pub ascending: bool,

    /// Sort key: price (default), title, or author
    #[serde(default)]
    pub order_by: SortKey,
}

fn default_page() -> u64 {
    MIN_PAGE
}

fn default_per_page() -> u64 {
    MIN_PER_PAGE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: MIN_PAGE,
            per_page: MIN_PER_PAGE,
            ascending: false,
            order_by: SortKey::Price,
        }
    }
}

/// A resolved page window over a collection of `total` items.
///
/// `page` is `0` only when the collection is empty; otherwise it is clamped
/// into `[1, total_pages]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
    pub to_skip: u64,
}

impl PageWindow {
    pub fn new(requested_page: u64, requested_per_page: u64, total: u64) -> Self {
        // Page size clamps into [MIN_PER_PAGE, MAX_PER_PAGE]
        let per_page = if (MIN_PER_PAGE..=MAX_PER_PAGE).contains(&requested_per_page) {
            requested_per_page
        } else if requested_per_page > MAX_PER_PAGE {
            MAX_PER_PAGE
        } else {
            MIN_PER_PAGE
        };

        // 0 pages for an empty collection, 1 page when everything fits
        let total_pages = if total > per_page {
            total.div_ceil(per_page)
        } else if total == 0 {
            0
        } else {
            1
        };

        // Requested page clamps into [MIN_PAGE, total_pages]
        let page = if (MIN_PAGE..=total_pages).contains(&requested_page) {
            requested_page
        } else if requested_page > total_pages {
            total_pages
        } else {
            MIN_PAGE
        };

        let to_skip = if page > MIN_PAGE {
            per_page * (page - 1)
        } else {
            0
        };

        Self {
            page,
            per_page,
            total,
            total_pages,
            to_skip,
        }
    }

    /// Window for the given request parameters against a known total.
    pub fn for_params(params: &PageParams, total: u64) -> Self {
        Self::new(params.page, params.per_page, total)
    }

    /// Skip count for the database query.
    pub fn skip(&self) -> u64 {
        self.to_skip
    }

    /// Limit for the database query.
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_page_clamps_low_and_high() {
        assert_eq!(PageWindow::new(1, 0, 100).per_page, MIN_PER_PAGE);
        assert_eq!(PageWindow::new(1, 4, 100).per_page, MIN_PER_PAGE);
        assert_eq!(PageWindow::new(1, 5, 100).per_page, 5);
        assert_eq!(PageWindow::new(1, 17, 100).per_page, 17);
        assert_eq!(PageWindow::new(1, 30, 100).per_page, 30);
        assert_eq!(PageWindow::new(1, 31, 100).per_page, MAX_PER_PAGE);
        assert_eq!(PageWindow::new(1, 10_000, 100).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_total_pages_rounding() {
        // 100 items at 10 per page: exactly 10 pages
        assert_eq!(PageWindow::new(1, 10, 100).total_pages, 10);
        // 101 items: the remainder gets a page of its own
        assert_eq!(PageWindow::new(1, 10, 101).total_pages, 11);
        // Everything fits on one page
        assert_eq!(PageWindow::new(1, 30, 7).total_pages, 1);
        assert_eq!(PageWindow::new(1, 5, 5).total_pages, 1);
    }

    #[test]
    fn test_empty_collection() {
        let window = PageWindow::new(3, 10, 0);
        assert_eq!(window.total_pages, 0);
        assert_eq!(window.page, 0);
        assert_eq!(window.to_skip, 0);
    }

    #[test]
    fn test_page_clamps_into_range() {
        // Page 0 becomes the first page
        assert_eq!(PageWindow::new(0, 10, 100).page, 1);
        // In-range pages pass through
        assert_eq!(PageWindow::new(7, 10, 100).page, 7);
        // Beyond-last clamps to the last page
        assert_eq!(PageWindow::new(99, 10, 100).page, 10);
    }

    #[test]
    fn test_skip_computation() {
        assert_eq!(PageWindow::new(1, 10, 100).to_skip, 0);
        assert_eq!(PageWindow::new(2, 10, 100).to_skip, 10);
        assert_eq!(PageWindow::new(10, 10, 100).to_skip, 90);
        // Clamped page drives the skip, not the requested page
        assert_eq!(PageWindow::new(50, 10, 100).to_skip, 90);
    }

    #[test]
    fn test_skip_never_reaches_past_collection() {
        for total in [0u64, 1, 4, 5, 29, 30, 31, 100, 1000] {
            for page in [0u64, 1, 2, 7, 10_000] {
                for per_page in [0u64, 5, 13, 30, 500] {
                    let w = PageWindow::new(page, per_page, total);
                    if total > 0 {
                        assert!(w.to_skip < total, "skip {} >= total {}", w.to_skip, total);
                    } else {
                        assert_eq!(w.to_skip, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_params_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 5);
        assert!(!params.ascending);
        assert_eq!(params.order_by, SortKey::Price);
    }
}
