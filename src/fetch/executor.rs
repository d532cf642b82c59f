use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::retry::RetryPolicy;
use super::{MatchPageSource, PageRequest};
use crate::config::settings::FetchSettings;
use crate::domain::{MatchRecord, TournamentSource};
use crate::errors::FetchFailed;
use crate::http::Session;
use crate::pagination::{OffsetCursor, PaginationConfig};
use crate::rate_limiter::RateLimiter;

/// Runs the complete paginated query for one tournament
pub struct FetchExecutor {
    source: Arc<dyn MatchPageSource>,
    pagination: PaginationConfig,
    retry: RetryPolicy,
    page_delay: Duration,
}

impl FetchExecutor {
    pub fn new(
        source: Arc<dyn MatchPageSource>,
        pagination: PaginationConfig,
        retry: RetryPolicy,
        page_delay: Duration,
    ) -> Self {
        Self {
            source,
            pagination,
            retry,
            page_delay,
        }
    }

    pub fn from_settings(source: Arc<dyn MatchPageSource>, settings: &FetchSettings) -> Self {
        let mut pagination = PaginationConfig::new(settings.page_limit);
        if let Some(max_pages) = settings.max_pages {
            pagination = pagination.with_max_pages(max_pages);
        }
        Self::new(
            source,
            pagination,
            RetryPolicy::from_settings(settings),
            settings.page_delay,
        )
    }

    /// All rows of every page identifier, in query order
    pub async fn fetch_tournament(
        &self,
        tournament: &TournamentSource,
        session: Option<&Session>,
    ) -> Result<Vec<MatchRecord>, FetchFailed> {
        let mut limiter = RateLimiter::new(self.page_delay);
        let mut all_rows = Vec::new();

        for page in &tournament.overview_pages {
            info!("Fetching {} ({})", tournament.slug, page);
            let rows = self
                .fetch_all_pages(&tournament.slug, page, session, &mut limiter)
                .await?;
            all_rows.extend(rows);
        }

        info!("Received {} rows for {}", all_rows.len(), tournament.slug);
        Ok(all_rows)
    }

    async fn fetch_all_pages(
        &self,
        slug: &str,
        page: &str,
        session: Option<&Session>,
        limiter: &mut RateLimiter,
    ) -> Result<Vec<MatchRecord>, FetchFailed> {
        let mut cursor = OffsetCursor::new(self.pagination.clone());
        let mut rows = Vec::new();

        while !cursor.is_finished() {
            limiter.wait().await;

            let request = PageRequest {
                page: page.to_string(),
                offset: cursor.offset(),
                limit: cursor.limit(),
            };
            let batch = self.fetch_page_with_retry(slug, &request, session).await?;

            cursor.advance(batch.len());
            rows.extend(batch);
        }

        Ok(rows)
    }

    async fn fetch_page_with_retry(
        &self,
        slug: &str,
        request: &PageRequest,
        session: Option<&Session>,
    ) -> Result<Vec<MatchRecord>, FetchFailed> {
        let mut attempt = 1;
        loop {
            match self.source.fetch_page(request, session).await {
                Ok(rows) => return Ok(rows),
                Err(error) if attempt >= self.retry.max_attempts => {
                    return Err(FetchFailed {
                        tournament: slug.to_string(),
                        page: request.page.clone(),
                        offset: request.offset,
                        attempts: attempt,
                        source: error,
                    });
                }
                Err(error) => {
                    let delay = self.retry.backoff(attempt, error.is_rate_limited());
                    warn!(
                        "Fetch failed for {} at offset {} (attempt {}): {}; retrying in {:?}",
                        slug, request.offset, attempt, error, delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
