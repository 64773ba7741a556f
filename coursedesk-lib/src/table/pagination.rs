//! Page bounds and navigation.

/// A pager button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    First,
    Prev,
    Next,
    Last,
}

/// Current page, page size and remote total.
///
/// `page` is zero-based and always within `0..max(page_count, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    page: usize,
    page_size: usize,
    total: usize,
}

impl PaginationState {
    /// Creates a state, clamping `page` into range and `page_size` to at
    /// least 1.
    pub fn new(page: usize, page_size: usize, total: usize) -> Self {
        let mut state = Self {
            page: 0,
            page_size: page_size.max(1),
            total,
        };
        state.page = page.min(state.last_page());
        state
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// `ceil(total / page_size)`; zero when there are no rows.
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    /// Index of the last reachable page.
    pub fn last_page(&self) -> usize {
        self.page_count().max(1) - 1
    }

    /// Returns `true` if the button is disabled at the current page.
    pub fn is_disabled(&self, nav: PageNav) -> bool {
        match nav {
            PageNav::First | PageNav::Prev => self.page == 0,
            PageNav::Next | PageNav::Last => self.page + 1 >= self.page_count(),
        }
    }

    /// Page a button leads to, or `None` if it is disabled.
    pub fn target(&self, nav: PageNav) -> Option<usize> {
        if self.is_disabled(nav) {
            return None;
        }
        Some(match nav {
            PageNav::First => 0,
            PageNav::Prev => self.page - 1,
            PageNav::Next => self.page + 1,
            PageNav::Last => self.last_page(),
        })
    }

    /// 1-based index range of the rows on this page, for "11-20 of 45" labels.
    pub fn row_range(&self) -> Option<(usize, usize)> {
        if self.total == 0 {
            return None;
        }
        let start = self.page.saturating_mul(self.page_size).saturating_add(1);
        let end = start.saturating_add(self.page_size - 1).min(self.total);
        Some((start, end))
    }
}
