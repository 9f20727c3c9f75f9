//! Pagination math for the student list.
//!
//! The backend pages with `_page`/`_limit` request params and reports the
//! collection size in a response header; everything here derives from that
//! total: how many pages exist, which neighbors a page has, and the row of
//! numbered links.

use url::form_urlencoded;

use crate::routes::Route;

/// Read the requested page from a query string.
///
/// Accepts the string with or without its leading `?`. The first `page`
/// parameter wins; anything missing, unparseable, or below 1 reads as
/// page 1.
pub fn page_from_query(query: &str) -> u32 {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "page")
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Number of pages needed for `total` records at `page_size` per page.
/// Zero records means zero pages.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64) as u32
}

/// Pager state for one rendering of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub current: u32,
    pub total_pages: u32,
}

impl Pager {
    pub fn from_counts(current: u32, total: u64, page_size: u32) -> Self {
        Self {
            current,
            total_pages: total_pages(total, page_size),
        }
    }

    /// Page to go back to, if any.
    pub fn prev(&self) -> Option<u32> {
        if self.total_pages == 0 || self.current <= 1 {
            None
        } else {
            Some(self.current - 1)
        }
    }

    /// Page to go forward to, if any.
    pub fn next(&self) -> Option<u32> {
        if self.total_pages == 0 || self.current >= self.total_pages {
            None
        } else {
            Some(self.current + 1)
        }
    }

    /// One link per page, in order, with the current page marked.
    pub fn links(&self) -> Vec<PageLink> {
        (1..=self.total_pages)
            .map(|page| PageLink {
                page,
                active: page == self.current,
                href: Route::Students { page }.path(),
            })
            .collect()
    }
}

/// A single numbered link in the pager row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub page: u32,
    pub active: bool,
    pub href: String,
}

// ============================================================
// Tests
// ============================================================
