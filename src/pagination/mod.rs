mod config;
mod iterator;

pub use config::{DEFAULT_PAGE_LIMIT, PaginationConfig};
pub use iterator::OffsetCursor;
