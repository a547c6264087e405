//! Result pagination
//!
//! `Paging` is a caller-owned out-parameter: the caller supplies it per call,
//! list coercion writes the server-reported `total` into it, and the caller
//! reads it back after the call returns. It must not be shared between
//! concurrent calls.

use serde::{Deserialize, Serialize};

/// Paging information for list queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// Current page indicator
    pub page: u32,
    /// Number of records to skip
    pub skip: u64,
    /// Number of records to return per page
    pub page_size: u32,
    /// Total record count in the database, written back by list queries
    pub total: u64,
}

impl Paging {
    /// Create paging information for a page request
    pub fn new(page: u32, skip: u64, page_size: u32) -> Self {
        Self {
            page,
            skip,
            page_size,
            total: 0,
        }
    }

    /// Number of pages needed to cover `total` at this page size
    pub fn max_page(&self) -> u32 {
        max_page(self.total, self.page_size)
    }
}

/// A materialized page of results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page<T> {
    /// The records on this page
    pub data: Vec<T>,
    /// Total record count across all pages
    pub total: u64,
}

impl<T> Page<T> {
    /// Create a page from records and a total count
    pub fn new(data: Vec<T>, total: u64) -> Self {
        Self { data, total }
    }

    /// Number of pages needed to cover the total at the given page size
    pub fn max_page(&self, page_size: u32) -> u32 {
        max_page(self.total, page_size)
    }
}

fn max_page(total: u64, page_size: u32) -> u32 {
    if total <= 1 || u64::from(page_size) >= total {
        return 1;
    }
    let page_size = u64::from(page_size.max(1));
    let pages = total / page_size + u64::from(total % page_size != 0);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_starts_with_zero_total() {
        let paging = Paging::new(1, 0, 25);
        assert_eq!(paging.page, 1);
        assert_eq!(paging.page_size, 25);
        assert_eq!(paging.total, 0);
    }

    #[test]
    fn test_max_page_rounding() {
        assert_eq!(Page::<i32>::new(vec![], 0).max_page(10), 1);
        assert_eq!(Page::<i32>::new(vec![], 1).max_page(10), 1);
        assert_eq!(Page::<i32>::new(vec![], 5).max_page(10), 1);
        assert_eq!(Page::<i32>::new(vec![], 10).max_page(10), 1);
        assert_eq!(Page::<i32>::new(vec![], 11).max_page(10), 2);
        assert_eq!(Page::<i32>::new(vec![], 100).max_page(10), 10);
        assert_eq!(Page::<i32>::new(vec![], 101).max_page(10), 11);
    }

    #[test]
    fn test_paging_max_page_uses_own_page_size() {
        let mut paging = Paging::new(1, 0, 20);
        paging.total = 45;
        assert_eq!(paging.max_page(), 3);
    }
}
