//! Page-number pagination.
//!
//! A requested page comes straight from a query string and is never an
//! error: anything that is not an integer resolves to the first page and
//! anything out of range resolves to the last one.

use serde::Serialize;

/// Posts shown per list page.
pub const POSTS_PER_PAGE: u64 = 3;

/// Splits `count` items into pages of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// Total number of pages. An empty result set still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw `page` parameter to a valid page.
    pub fn page(&self, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages();
        let number = match requested.map(str::trim) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n < 1 || n as u64 > num_pages => num_pages,
                Ok(n) => n as u64,
                // integers too wide for i64 are still out of range
                Err(_) if is_integer(raw) => num_pages,
                Err(_) => 1,
            },
        };

        PageWindow {
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}

/// Optional sign followed by at least one ASCII digit.
fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// A resolved page: which slice of the result set to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub per_page: u64,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }
}
