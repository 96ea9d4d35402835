pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 5;

/// Normalized paging window. `page` and `page_size` are always ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Missing or non-positive values fall back to 1 (page) / clamp to 1
    /// (page size); page size is capped at `max_page_size`.
    pub fn new(page: Option<i64>, page_size: Option<i64>, max_page_size: u64) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1) as u64;
        let page_size = (page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1) as u64)
            .min(max_page_size.max(1));
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn total_pages(&self, total_records: i64) -> i64 {
        let size = self.page_size as i64;
        if total_records <= 0 {
            return 0;
        }
        (total_records + size - 1) / size
    }
}
