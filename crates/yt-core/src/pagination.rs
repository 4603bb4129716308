//! Page arithmetic shared by every feed.

use serde::Serialize;

/// Splits `count` ordered items into pages of `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
    count: u64,
}

impl Paginator {
    /// `per_page` of zero is treated as one.
    pub fn new(per_page: u64, count: u64) -> Self {
        Self {
            per_page: per_page.max(1),
            count,
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Always at least one, so an empty feed still has a (blank) first page.
    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolves a raw `?page=` value: missing or not an integer gives 1,
    /// any integer outside `1..=num_pages` (zero and negatives included)
    /// gives the last page.
    pub fn resolve(&self, requested: Option<&str>) -> u64 {
        let last = self.num_pages();
        match requested.and_then(|raw| raw.trim().parse::<i64>().ok()) {
            None => 1,
            Some(n) if n < 1 => last,
            Some(n) => (n as u64).min(last),
        }
    }

    /// Offset and limit of a resolved page number.
    pub fn bounds(&self, number: u64) -> (u64, u64) {
        let offset = (number - 1) * self.per_page;
        let limit = self.per_page.min(self.count.saturating_sub(offset));
        (offset, limit)
    }
}

/// One page of results plus what templates need to link to its neighbours.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u64, paginator: &Paginator) -> Self {
        Self {
            items,
            number,
            num_pages: paginator.num_pages(),
            count: paginator.count(),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> u64 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> u64 {
        (self.number + 1).min(self.num_pages)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
        }
    }
}
