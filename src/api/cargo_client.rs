use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::api::parsers;
use crate::config::settings::FetchSettings;
use crate::domain::MatchRecord;
use crate::errors::FetchError;
use crate::fetch::{MatchPageSource, PageRequest};
use crate::http::{Session, SessionClient};

const TABLE: &str = "MatchSchedule";
const FIELDS: &str =
    "Team1,Team2,Team1Score,Team2Score,DateTime_UTC,OverviewPage,BestOf,N_MatchInPage,Tab,Round";
const ORDER_BY: &str = "DateTime_UTC ASC";

/// Client for the wiki's cargo query endpoint
pub struct CargoClient {
    client: SessionClient,
    api_url: String,
}

impl CargoClient {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = SessionClient::new(&settings.user_agent, settings.timeout_secs)?;
        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
        })
    }

    // --- Helper Methods ---

    fn build_page_url(&self, request: &PageRequest) -> String {
        let params = [
            ("action", "cargoquery".to_string()),
            ("format", "json".to_string()),
            ("tables", TABLE.to_string()),
            ("fields", FIELDS.to_string()),
            ("where", Self::build_where_clause(&request.page)),
            ("limit", request.limit.to_string()),
            ("offset", request.offset.to_string()),
            ("order_by", ORDER_BY.to_string()),
            ("origin", "*".to_string()),
        ];

        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.api_url, query)
    }

    /// Prefix match on the tournament's overview page
    fn build_where_clause(page: &str) -> String {
        let escaped = page.replace('\\', "\\\\").replace('\'', "\\'");
        format!("OverviewPage LIKE '{}%'", escaped)
    }
}

#[async_trait]
impl MatchPageSource for CargoClient {
    async fn fetch_page(
        &self,
        request: &PageRequest,
        session: Option<&Session>,
    ) -> Result<Vec<MatchRecord>, FetchError> {
        let url = self.build_page_url(request);
        debug!("GET {}", url);

        let response = self.client.get(&url, session).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        parsers::parse_page(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::header::COOKIE;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn client() -> CargoClient {
        CargoClient::new(&FetchSettings::default()).unwrap()
    }

    async fn cargo_query(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
        if params.get("where").is_some_and(|w| w.starts_with("OverviewPage LIKE 'Busy")) {
            return (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response();
        }

        let cookie = headers.get(COOKIE).and_then(|v| v.to_str().ok()).unwrap_or("-");
        let offset = params.get("offset").cloned().unwrap_or_default();
        Json(json!({
            "cargoquery": [
                {"title": {"Team1": "T1", "Team2": cookie, "Team1Score": "2", "Team2Score": offset, "BestOf": "3"}}
            ]
        }))
        .into_response()
    }

    async fn spawn_cargo() -> CargoClient {
        let app = Router::new().route("/api.php", get(cargo_query));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        CargoClient::new(&FetchSettings {
            api_url: format!("http://{}/api.php", addr),
            ..FetchSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_page_sends_cursor_and_session() {
        let client = spawn_cargo().await;
        let session = Session {
            cookie: "wiki_session=abc".to_string(),
            user_agent: "MatchPoller/1.0 (bot)".to_string(),
        };
        let request = PageRequest {
            page: "LCK/2026 Season".to_string(),
            offset: 1,
            limit: 50,
        };

        let rows = client.fetch_page(&request, Some(&session)).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team1.as_deref(), Some("T1"));
        assert_eq!(rows[0].team2.as_deref(), Some("wiki_session=abc"));
        assert_eq!(rows[0].team2_score.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_fetch_page_classifies_rate_limit() {
        let client = spawn_cargo().await;
        let request = PageRequest {
            page: "Busy/2026".to_string(),
            offset: 0,
            limit: 50,
        };

        let err = client.fetch_page(&request, None).await.unwrap_err();

        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_where_clause_is_prefix_match() {
        assert_eq!(
            CargoClient::build_where_clause("LCK/2026 Season"),
            "OverviewPage LIKE 'LCK/2026 Season%'"
        );
    }

    #[test]
    fn test_where_clause_escapes_quotes() {
        assert_eq!(
            CargoClient::build_where_clause("Worlds'26"),
            "OverviewPage LIKE 'Worlds\\'26%'"
        );
    }

    #[test]
    fn test_page_url_carries_cursor() {
        let url = client().build_page_url(&PageRequest {
            page: "LPL/2026 Season/Split 1".to_string(),
            offset: 100,
            limit: 50,
        });

        assert!(url.starts_with("https://lol.fandom.com/api.php?action=cargoquery&format=json"));
        assert!(url.contains("&limit=50&offset=100&"));
        assert!(url.contains("tables=MatchSchedule"));
        assert!(url.contains("where=OverviewPage%20LIKE%20%27LPL%2F2026%20Season%2FSplit%201%25%27"));
    }
}
