use crate::models::Page;

use super::location::Location;

/// Most page-number buttons shown at once
pub const WINDOW: u32 = 5;

pub fn total_pages(count: u64, per_page: usize) -> u32 {
    if per_page == 0 {
        return 0;
    }
    count.div_ceil(per_page as u64) as u32
}

/// Page numbers to render around `current` (1-based)
pub fn page_window(total_pages: u32, current: u32) -> Vec<u32> {
    let first = if total_pages <= WINDOW || current <= 3 {
        1
    } else if current >= total_pages - 2 {
        total_pages - WINDOW + 1
    } else {
        current - 2
    };

    (first..first + WINDOW.min(total_pages)).collect()
}

/// Page-number controls for one listing response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub current: u32,
    pub total_pages: u32,
    pub window: Vec<u32>,
    /// Enabled exactly when the response links a previous page
    pub has_previous: bool,
    /// Enabled exactly when the response links a next page
    pub has_next: bool,
}

impl Pagination {
    /// `None` when everything fits on one page
    pub fn from_page<T>(page: &Page<T>, current: u32, fallback_page_size: usize) -> Option<Self> {
        let len = page.results.len();
        let on_last_page = !page.has_next() && current > 1 && len > 0;

        // Earlier pages are full, so the last page reveals the backend's size
        let per_page = if on_last_page && page.count > len as u64 {
            ((page.count - len as u64) / u64::from(current - 1)).max(1) as usize
        } else if len == 0 {
            fallback_page_size
        } else {
            len
        };

        let mut total_pages = total_pages(page.count, per_page);
        if len > 0 {
            total_pages = total_pages.max(current);
        }
        if total_pages <= 1 {
            return None;
        }

        Some(Self {
            current,
            total_pages,
            window: page_window(total_pages, current),
            has_previous: page.has_previous(),
            has_next: page.has_next(),
        })
    }

    pub fn is_current(&self, page: u32) -> bool {
        page == self.current
    }

    pub fn previous_href(&self, location: &Location) -> Option<String> {
        self.has_previous
            .then(|| location.page_href(self.current.saturating_sub(1).max(1)))
    }

    pub fn next_href(&self, location: &Location) -> Option<String> {
        self.has_next.then(|| location.page_href(self.current + 1))
    }
}
