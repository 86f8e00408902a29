//! Offset/limit windowing for thread and reply listings.

use serde::Serialize;

/// Threads per forum page and replies per thread page.
pub const PAGE_SIZE: i64 = 10;

/// A 1-based page number paired with a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: i64,
    size: i64,
}

impl PageRequest {
    pub fn new(number: i64) -> Self {
        Self::with_size(number, PAGE_SIZE)
    }

    pub fn with_size(number: i64, size: i64) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    /// Parses a `?page=` value. Absent, non-numeric, zero and negative
    /// values all mean the first page.
    pub fn from_query(raw: Option<&str>) -> Self {
        let number = raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(1);
        Self::new(number)
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// `ceil(total / size)`; zero items means zero pages.
pub fn total_pages(total_items: i64, size: i64) -> i64 {
    if total_items <= 0 {
        return 0;
    }
    let size = size.max(1);
    (total_items + size - 1) / size
}

/// One window of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: i64) -> Self {
        Self {
            items,
            page: request.number(),
            total_items,
            total_pages: total_pages(total_items, request.limit()),
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn prev_page(&self) -> i64 {
        (self.page - 1).max(1)
    }

    pub fn next_page(&self) -> i64 {
        self.page + 1
    }

    /// Page links are only worth rendering when there is more than one page.
    pub fn is_multi_page(&self) -> bool {
        self.total_pages > 1
    }
}
