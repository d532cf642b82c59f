use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serde_json::Value;

use crate::config::settings::{AuthSettings, FetchSettings};
use crate::errors::AuthError;
use crate::http::{Session, SessionClient, collect_cookies};

/// Produces an optional reusable session for upstream requests.
///
/// `Ok(None)` means "run anonymously by choice"; an error means login was
/// attempted and failed, which callers also treat as anonymous.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn session(&self) -> Result<Option<Session>, AuthError>;
}

/// Used when no credentials are configured
pub struct Anonymous;

#[async_trait]
impl AuthProvider for Anonymous {
    async fn session(&self) -> Result<Option<Session>, AuthError> {
        Ok(None)
    }
}

pub fn build_auth_provider(auth: &AuthSettings, fetch: &FetchSettings) -> Result<Box<dyn AuthProvider>> {
    Ok(match auth.credentials() {
        Some((user, pass)) => Box::new(WikiLogin::new(&fetch.api_url, user, pass, fetch.timeout_secs)?),
        None => Box::new(Anonymous),
    })
}

/// MediaWiki bot login: fetch a login token, then post credentials
/// together with the temporary session cookie from the first step.
pub struct WikiLogin {
    client: SessionClient,
    api_url: String,
    username: String,
    password: String,
    user_agent: String,
}

impl WikiLogin {
    pub fn new(api_url: &str, username: &str, password: &str, timeout_secs: u64) -> Result<Self> {
        let user_agent = format!("MatchPoller/1.0 ({})", username);
        Ok(Self {
            client: SessionClient::new(&user_agent, timeout_secs)?,
            api_url: api_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            user_agent,
        })
    }

    async fn fetch_login_token(&self) -> Result<(String, String), AuthError> {
        let url = format!("{}?action=query&meta=tokens&type=login&format=json", self.api_url);
        let response = self.client.get(&url, None).send().await?;

        if !response.status().is_success() {
            return Err(AuthError::Token(format!("HTTP {}", response.status())));
        }

        let cookie = collect_cookies(&response);
        let data: Value = response.json().await?;
        let token = data
            .pointer("/query/tokens/logintoken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Token("response carried no login token".to_string()))?;

        Ok((token.to_string(), cookie))
    }

    async fn post_login(&self, token: &str, step_cookie: &str) -> Result<Session, AuthError> {
        let temporary = Session {
            cookie: step_cookie.to_string(),
            user_agent: self.user_agent.clone(),
        };
        let form = [
            ("action", "login"),
            ("format", "json"),
            ("lgname", self.username.as_str()),
            ("lgpassword", self.password.as_str()),
            ("lgtoken", token),
        ];

        let response = self
            .client
            .post(&self.api_url, Some(&temporary))
            .form(&form)
            .send()
            .await?;

        let login_cookie = collect_cookies(&response);
        let data: Value = response.json().await?;
        let login = data.get("login");

        match login.and_then(|l| l.get("result")).and_then(Value::as_str) {
            Some("Success") => {
                let name = login
                    .and_then(|l| l.get("lgusername"))
                    .and_then(Value::as_str)
                    .unwrap_or(&self.username);
                info!("Authenticated as {}", name);
                Ok(Session {
                    cookie: merge_cookies(step_cookie, &login_cookie),
                    user_agent: self.user_agent.clone(),
                })
            }
            _ => {
                let reason = login
                    .and_then(|l| l.get("reason"))
                    .map(|r| r.as_str().map(str::to_string).unwrap_or_else(|| r.to_string()))
                    .unwrap_or_else(|| data.to_string());
                Err(AuthError::Rejected(reason))
            }
        }
    }
}

#[async_trait]
impl AuthProvider for WikiLogin {
    async fn session(&self) -> Result<Option<Session>, AuthError> {
        let (token, cookie) = self.fetch_login_token().await?;
        let session = self.post_login(&token, &cookie).await?;
        Ok(Some(session))
    }
}

/// Combine two cookie headers; pairs from `newer` replace same-named pairs
fn merge_cookies(older: &str, newer: &str) -> String {
    let mut merged: Vec<(String, String)> = Vec::new();

    for pair in older.split(';').chain(newer.split(';')) {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        match merged.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => merged.push((name.to_string(), value.to_string())),
        }
    }

    merged
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
