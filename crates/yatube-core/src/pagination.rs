//! Splitting ordered listings into fixed-size pages.

use serde::Serialize;

/// Page arithmetic for a listing of `count` items.
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

    /// An empty listing still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw `page` query value to a valid page number.
    ///
    /// Missing or non-numeric values give the first page; out-of-range
    /// numbers clamp to the nearest valid page.
    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let last = self.num_pages();
        let Some(raw) = raw.map(str::trim) else {
            return 1;
        };
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return 1;
        }
        if negative {
            return 1;
        }
        // Too many digits for u64 is still a number past the last page.
        digits.parse::<u64>().unwrap_or(u64::MAX).clamp(1, last)
    }

    /// `(offset, limit)` of the given page number.
    pub fn window(&self, number: u64) -> (u64, u64) {
        ((number.max(1) - 1) * self.per_page, self.per_page)
    }

    /// Wrap the items fetched for `number` with pagination metadata.
    pub fn page<T>(&self, number: u64, object_list: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            object_list,
            number,
            num_pages,
            count: self.count,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            object_list: self.object_list.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
