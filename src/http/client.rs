use anyhow::{Context, Result};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Reusable authenticated session handed out by the auth provider
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub cookie: String,
    pub user_agent: String,
}

/// HTTP client that attaches an optional session to every request
pub struct SessionClient {
    client: Client,
    default_user_agent: String,
}

impl SessionClient {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let client = Self::build_client(timeout_secs)?;
        Ok(Self {
            client,
            default_user_agent: user_agent.to_string(),
        })
    }

    pub fn get(&self, url: &str, session: Option<&Session>) -> RequestBuilder {
        self.decorate(self.client.get(url), session)
    }

    pub fn post(&self, url: &str, session: Option<&Session>) -> RequestBuilder {
        self.decorate(self.client.post(url), session)
    }

    fn decorate(&self, request: RequestBuilder, session: Option<&Session>) -> RequestBuilder {
        let user_agent = session
            .map(|s| s.user_agent.as_str())
            .unwrap_or(&self.default_user_agent);

        let mut request = request.header(USER_AGENT, user_agent);
        if let Some(cookie) = session.map(|s| s.cookie.as_str()).filter(|c| !c.is_empty()) {
            request = request.header(COOKIE, cookie);
        }
        request
    }

    fn build_client(timeout_secs: u64) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")
    }
}

/// Collapse every `Set-Cookie` header into a `Cookie` request value
pub fn collect_cookies(response: &Response) -> String {
    cookie_header(response.headers())
}

fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value: &HeaderValue| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect::<Vec<_>>()
        .join("; ")
}
