use serde::Serialize;

/// Number of page links shown around the current page.
pub const PAGE_WINDOW: usize = 5;

/// Number of pages needed for `count` items; an empty result still has one page.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if count == 0 {
        return 1;
    }
    count.div_ceil(page_size.max(1))
}

/// Sliding window of at most [`PAGE_WINDOW`] consecutive pages centered on
/// `current_page` and shifted to stay within `[1, total_pages]`.
pub fn page_window(count: usize, current_page: usize, page_size: usize) -> Vec<usize> {
    let last_page = total_pages(count, page_size);
    let current_page = current_page.clamp(1, last_page);

    let mut start = current_page.saturating_sub(PAGE_WINDOW / 2).max(1);
    let end = (start + PAGE_WINDOW - 1).min(last_page);

    if end - start < PAGE_WINDOW - 1 {
        start = end.saturating_sub(PAGE_WINDOW - 1).max(1);
    }

    (start..=end).collect()
}

/// Transient page selection of the pager control.
///
/// The selection is reset to the first page whenever the result count or the
/// page size changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pager {
    count: usize,
    page_size: usize,
    selected: usize,
}

impl Pager {
    pub fn new(count: usize, page_size: usize) -> Self {
        Self {
            count,
            page_size: page_size.max(1),
            selected: 1,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.count, self.page_size)
    }

    /// Updates the result count, resetting the selection when it changed.
    pub fn set_count(&mut self, count: usize) {
        if count != self.count {
            self.count = count;
            self.selected = 1;
        }
    }

    /// Updates the page size, resetting the selection when it changed.
    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if page_size != self.page_size {
            self.page_size = page_size;
            self.selected = 1;
        }
    }

    /// Selects a page number, returning the clamped target.
    pub fn select(&mut self, page: usize) -> usize {
        self.selected = page.clamp(1, self.total_pages());
        self.selected
    }

    /// Target of the back link, clamped to the first page.
    pub fn previous_page(&self) -> usize {
        self.selected.saturating_sub(1).max(1)
    }

    /// Target of the forward link, clamped to the last page.
    pub fn next_page(&self) -> usize {
        (self.selected + 1).min(self.total_pages())
    }

    /// Snapshot used by templates and the JSON API.
    pub fn view(&self) -> PagerView {
        PagerView {
            count: self.count,
            page: self.selected,
            total_pages: self.total_pages(),
            pages: page_window(self.count, self.selected, self.page_size),
            has_previous: self.selected > 1,
            has_next: self.selected < self.total_pages(),
            previous_page: self.previous_page(),
            next_page: self.next_page(),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PagerView {
    pub count: usize,
    pub page: usize,
    pub total_pages: usize,
    pub pages: Vec<usize>,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: usize,
    pub next_page: usize,
}

impl PagerView {
    /// Result count label shown above the page links.
    pub fn summary(&self) -> String {
        if self.count > 0 {
            format!("There are {} results", self.count)
        } else {
            "No results".to_string()
        }
    }
}
