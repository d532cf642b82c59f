mod executor;
mod retry;

use async_trait::async_trait;

use crate::domain::MatchRecord;
use crate::errors::FetchError;
use crate::http::Session;

pub use executor::FetchExecutor;
pub use retry::RetryPolicy;

/// One offset/limit window of one upstream page identifier
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: String,
    pub offset: usize,
    pub limit: usize,
}

/// A single upstream page request, classified into rows or a typed failure
#[async_trait]
pub trait MatchPageSource: Send + Sync {
    async fn fetch_page(
        &self,
        request: &PageRequest,
        session: Option<&Session>,
    ) -> Result<Vec<MatchRecord>, FetchError>;
}
