use serde::Deserialize;

// Default page size for feed and search listings
const DEFAULT_PAGE_SIZE: u32 = 20;
// Max size to prevent excessive requests
const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page parameters for feed and search listings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    page_size: u32,
}

impl PageParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn page_size(&self) -> u32 {
        if self.page_size == 0 {
            // If page_size wasn't provided (or explicitly 0), use default
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size.min(MAX_PAGE_SIZE).max(1)
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size() as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.page_size() as i64
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
