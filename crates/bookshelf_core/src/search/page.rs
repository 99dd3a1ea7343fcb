//! Page window arithmetic for book listings.
//!
//! # Invariants
//! - Page numbers are 1-based; anything unparsable or below 1 becomes 1.
//! - `offset = (page - 1) * page_size`.
//! - `total_pages = ceil(total_count / page_size)`.

use serde::Serialize;

/// Number of books shown per listing page.
pub const PAGE_SIZE: u32 = 5;

/// Requested listing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PageRequest {
    /// Creates a request for `page` with the default page size.
    pub fn new(page: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: PAGE_SIZE,
        }
    }

    /// Creates a request from a raw caller-supplied page value.
    pub fn parse(raw: Option<&str>) -> Self {
        Self::new(parse_page(raw))
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Maximum number of rows in this window.
    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

/// Parses a page value with integer-prefix semantics.
///
/// Leading whitespace and a sign are accepted and trailing garbage is
/// ignored (`"3abc"` is page 3). Absent, non-numeric, zero and negative
/// values all yield page 1; values past `u32::MAX` saturate.
pub fn parse_page(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return 1;
    };
    let text = raw.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digit_count = digits.bytes().take_while(u8::is_ascii_digit).count();
    if digit_count == 0 || negative {
        return 1;
    }

    let value = digits[..digit_count]
        .bytes()
        .fold(0_u32, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u32::from(digit - b'0'))
        });
    value.max(1)
}

/// Returns the number of pages needed for `total_count` rows.
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size))
}

/// Page metadata returned alongside a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(request: PageRequest, total_count: u64) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            total_count,
            total_pages: total_pages(total_count, request.page_size),
        }
    }

    /// Previous page number, if the current page is not the first.
    pub fn previous_page(&self) -> Option<u32> {
        (self.page > 1).then(|| self.page - 1)
    }

    /// Next page number, if more pages follow the current one.
    pub fn next_page(&self) -> Option<u32> {
        (u64::from(self.page) < self.total_pages).then(|| self.page + 1)
    }
}
