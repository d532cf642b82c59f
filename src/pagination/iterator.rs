use super::config::PaginationConfig;

/// Offset cursor over a paginated upstream query
pub struct OffsetCursor {
    offset: usize,
    pages_fetched: usize,
    finished: bool,
    config: PaginationConfig,
}

impl OffsetCursor {
    pub fn new(config: PaginationConfig) -> Self {
        Self {
            offset: 0,
            pages_fetched: 0,
            finished: false,
            config,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.config.limit
    }

    pub fn is_finished(&self) -> bool {
        self.finished || self.has_reached_max()
    }

    /// Record a received page. A short or empty page ends the query.
    pub fn advance(&mut self, rows_received: usize) {
        self.pages_fetched += 1;
        self.offset += rows_received;
        if rows_received < self.config.limit {
            self.finished = true;
        }
    }

    fn has_reached_max(&self) -> bool {
        self.config
            .max_pages
            .is_some_and(|max| self.pages_fetched >= max)
    }
}
