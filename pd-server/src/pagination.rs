//! Page-number pagination.

use serde::{Deserialize, Serialize};

use pd_core::config::PaginationConfig;

/// `?page=&page_size=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// A resolved page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-indexed.
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    /// Resolve parameters against the configured default and maximum.
    ///
    /// The page is at least 1 and the size is clamped to `1..=max_page_size`.
    pub fn resolve(params: PageParams, config: &PaginationConfig) -> Self {
        Self {
            page: params.page.unwrap_or(1).max(1),
            page_size: params
                .page_size
                .unwrap_or(config.page_size)
                .clamp(1, config.max_page_size.max(1)),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

/// Paginated response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Total across all pages.
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(page: Page, count: i64, results: Vec<T>) -> Self {
        Self {
            count,
            page: page.page,
            page_size: page.page_size,
            results,
        }
    }
}
