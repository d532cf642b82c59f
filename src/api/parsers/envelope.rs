use serde_json::Value;

use crate::domain::MatchRecord;
use crate::errors::{FetchError, preview};

/// Key holding the result rows in a cargo query response
pub const RESULT_KEY: &str = "cargoquery";

const TOO_MANY_REQUESTS: u16 = 429;

/// Classify one page response into rows or a typed failure.
///
/// Checks run in order: rate limit, HTTP status, JSON, error envelope,
/// result container.
pub fn parse_page(status: u16, body: &str) -> Result<Vec<MatchRecord>, FetchError> {
    if status == TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }
    if !(200..300).contains(&status) {
        return Err(FetchError::http(status, body));
    }

    let data: Value = serde_json::from_str(body).map_err(|_| FetchError::NotJson {
        preview: preview(body),
    })?;

    if let Some(error) = data.get("error") {
        return Err(upstream_error(error));
    }

    let rows = data
        .get(RESULT_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::MissingResults {
            preview: preview(body),
        })?;

    rows.iter().map(|item| parse_row(item, body)).collect()
}

fn upstream_error(error: &Value) -> FetchError {
    let field = |name: &str| {
        error
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    };
    FetchError::Upstream {
        code: field("code"),
        info: field("info"),
    }
}

fn parse_row(item: &Value, body: &str) -> Result<MatchRecord, FetchError> {
    item.get("title")
        .filter(|title| title.is_object())
        .and_then(|title| serde_json::from_value(title.clone()).ok())
        .ok_or_else(|| FetchError::MissingResults {
            preview: preview(body),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_unwrapped_from_title() {
        let body = r#"{"cargoquery": [
            {"title": {"Team1": "T1", "Team2": "GEN", "Team1Score": "2", "Team2Score": "1"}},
            {"title": {"Team1": "DK", "Team2": "KT", "Team1Score": "", "Team2Score": ""}}
        ]}"#;

        let rows = parse_page(200, body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].team1.as_deref(), Some("T1"));
        assert!(!rows[1].has_reported_score());
    }

    #[test]
    fn test_rate_limit_is_its_own_class() {
        assert!(matches!(parse_page(429, "slow down"), Err(FetchError::RateLimited)));
    }

    #[test]
    fn test_http_error_keeps_status() {
        match parse_page(503, "<html>maintenance</html>") {
            Err(FetchError::Http { status, preview }) => {
                assert_eq!(status, 503);
                assert!(preview.contains("maintenance"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_html_body_is_not_json() {
        assert!(matches!(
            parse_page(200, "<!DOCTYPE html><p>captcha</p>"),
            Err(FetchError::NotJson { .. })
        ));
    }

    #[test]
    fn test_error_envelope_is_upstream_failure() {
        let body = r#"{"error": {"code": "MWException", "info": "Query timed out"}}"#;
        match parse_page(200, body) {
            Err(FetchError::Upstream { code, info }) => {
                assert_eq!(code, "MWException");
                assert_eq!(info, "Query timed out");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_container_is_malformed() {
        assert!(matches!(
            parse_page(200, r#"{"batchcomplete": ""}"#),
            Err(FetchError::MissingResults { .. })
        ));
    }

    #[test]
    fn test_empty_container_is_valid() {
        assert!(parse_page(200, r#"{"cargoquery": []}"#).unwrap().is_empty());
    }
}
