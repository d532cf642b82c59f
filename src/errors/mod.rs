use thiserror::Error;

/// Longest slice of an upstream body quoted in error messages
const BODY_PREVIEW_CHARS: usize = 150;

/// Failure of a single page request, before retries are exhausted
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("HTTP {status}: {preview}")]
    Http { status: u16, preview: String },

    #[error("response is not JSON: {preview}")]
    NotJson { preview: String },

    #[error("upstream error [{code}]: {info}")]
    Upstream { code: String, info: String },

    #[error("response has no result container: {preview}")]
    MissingResults { preview: String },
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }

    pub fn http(status: u16, body: &str) -> Self {
        FetchError::Http {
            status,
            preview: preview(body),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// A tournament's fetch failed for this run after all retries
#[derive(Debug, Error)]
#[error("{tournament}: page '{page}' failed at offset {offset} after {attempts} attempts: {source}")]
pub struct FetchFailed {
    pub tournament: String,
    pub page: String,
    pub offset: usize,
    pub attempts: u32,
    #[source]
    pub source: FetchError,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file '{0}' is missing")]
    Missing(String),

    #[error("configuration '{name}' could not be read: {reason}")]
    Unreadable { name: String, reason: String },

    #[error("configuration lists no tournaments")]
    NoTournaments,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login token request failed: {0}")]
    Token(String),

    #[error("login rejected: {0}")]
    Rejected(String),

    #[error("login transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Shortens an upstream body for logging, respecting char boundaries
pub fn preview(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
