/// Default rows requested per upstream page
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Configuration for offset/limit paginated queries
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub limit: usize,
    pub max_pages: Option<usize>,
}

impl PaginationConfig {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            max_pages: None,
        }
    }

    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = Some(max);
        self
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}
