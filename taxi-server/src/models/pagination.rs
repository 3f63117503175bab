//! Pagination types
//!
//! List views are paged at a fixed size. The page number arrives as a raw
//! query string value so that `last` and malformed numbers can be told apart.

use serde::{Deserialize, Serialize};

/// Items per page on every list view
pub const PAGE_SIZE: u32 = 5;

/// Requested page could not be served
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPage {
    #[error("page number '{0}' is not an integer")]
    NotANumber(String),

    #[error("page number {0} is less than 1")]
    TooSmall(i64),

    #[error("page {page} contains no results (last page is {last})")]
    Empty { page: u32, last: u32 },
}

/// Page selector parsed from the query string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(u32),
    Last,
}

impl PageRequest {
    /// Parse the `page` query value. Absent means the first page.
    pub fn parse(raw: Option<&str>) -> Result<Self, InvalidPage> {
        let Some(raw) = raw else {
            return Ok(Self::Number(1));
        };
        let raw = raw.trim();
        if raw == "last" {
            return Ok(Self::Last);
        }
        let number: i64 = raw
            .parse()
            .map_err(|_| InvalidPage::NotANumber(raw.to_owned()))?;
        if number < 1 {
            return Err(InvalidPage::TooSmall(number));
        }
        let number = u32::try_from(number).map_err(|_| InvalidPage::NotANumber(raw.to_owned()))?;
        Ok(Self::Number(number))
    }
}

/// Resolved pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl Pagination {
    /// Create pagination with clamping.
    ///
    /// - Page is clamped to minimum of 1
    /// - Per page is clamped to minimum of 1
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Resolve a page request against the total row count.
    ///
    /// An empty result set still has a valid first page.
    pub fn resolve(request: PageRequest, per_page: u32, total: i64) -> Result<Self, InvalidPage> {
        let last = num_pages(total, per_page);
        let page = match request {
            PageRequest::Last => last,
            PageRequest::Number(n) => n,
        };
        if page > last {
            return Err(InvalidPage::Empty { page, last });
        }
        Ok(Self::new(page, per_page))
    }

    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Get LIMIT value.
    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PAGE_SIZE,
        }
    }
}

fn num_pages(total: i64, per_page: u32) -> u32 {
    let per_page = i64::from(per_page.max(1));
    let total = total.max(0);
    let pages = (total + per_page - 1) / per_page;
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// One page of records plus the total across all pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items for current page
    pub items: Vec<T>,
    /// Total count across all pages
    pub total: i64,
    /// Current page number
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: Pagination) -> Self {
        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        }
    }

    /// Calculate total number of pages.
    pub fn total_pages(&self) -> u32 {
        num_pages(self.total, self.per_page)
    }

    /// Check if there's a next page.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there's a previous page.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Whether the result set spans more than one page.
    pub fn is_paginated(&self) -> bool {
        self.total_pages() > 1
    }

    /// Page metadata for list contexts.
    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            number: self.page,
            num_pages: self.total_pages(),
            has_next: self.has_next(),
            has_previous: self.has_prev(),
            count: self.total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Serialized page metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub number: u32,
    pub num_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
    pub count: i64,
}

/// Query parameters for pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_calculation() {
        let p = Pagination::new(1, 5);
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(2, 5);
        assert_eq!(p.offset(), 5);

        let p = Pagination::new(3, 25);
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn clamps_page() {
        let p = Pagination::new(0, 10);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn parses_page_requests() {
        assert_eq!(PageRequest::parse(None), Ok(PageRequest::Number(1)));
        assert_eq!(PageRequest::parse(Some("3")), Ok(PageRequest::Number(3)));
        assert_eq!(PageRequest::parse(Some("last")), Ok(PageRequest::Last));
        assert_eq!(PageRequest::parse(Some("0")), Err(InvalidPage::TooSmall(0)));
        assert!(matches!(
            PageRequest::parse(Some("two")),
            Err(InvalidPage::NotANumber(_))
        ));
    }

    #[test]
    fn resolve_against_total() {
        let p = Pagination::resolve(PageRequest::Number(2), PAGE_SIZE, 12).unwrap();
        assert_eq!(p.page, 2);

        let p = Pagination::resolve(PageRequest::Last, PAGE_SIZE, 12).unwrap();
        assert_eq!(p.page, 3);

        let err = Pagination::resolve(PageRequest::Number(4), PAGE_SIZE, 12).unwrap_err();
        assert_eq!(err, InvalidPage::Empty { page: 4, last: 3 });
    }

    #[test]
    fn empty_table_has_first_page() {
        let p = Pagination::resolve(PageRequest::Number(1), PAGE_SIZE, 0).unwrap();
        assert_eq!(p.page, 1);
        assert!(Pagination::resolve(PageRequest::Number(2), PAGE_SIZE, 0).is_err());
    }

    #[test]
    fn total_pages() {
        let paginated: Paginated<()> = Paginated::new(vec![], 0, Pagination::new(1, 5));
        assert_eq!(paginated.total_pages(), 1);
        assert!(!paginated.is_paginated());

        let paginated: Paginated<()> = Paginated::new(vec![], 11, Pagination::new(1, 5));
        assert_eq!(paginated.total_pages(), 3);
        assert!(paginated.is_paginated());

        let paginated: Paginated<()> = Paginated::new(vec![], 10, Pagination::new(1, 5));
        assert_eq!(paginated.total_pages(), 2);
    }

    #[test]
    fn has_next_prev() {
        let paginated: Paginated<()> = Paginated::new(vec![], 15, Pagination::new(1, 5));
        assert!(paginated.has_next());
        assert!(!paginated.has_prev());

        let paginated: Paginated<()> = Paginated::new(vec![], 15, Pagination::new(2, 5));
        assert!(paginated.has_next());
        assert!(paginated.has_prev());

        let paginated: Paginated<()> = Paginated::new(vec![], 15, Pagination::new(3, 5));
        assert!(!paginated.has_next());
        assert!(paginated.has_prev());
    }
}
