use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use std::sync::Arc;

use super::AppState;

/// Runs a forced poll cycle and returns its report
pub async fn force_run(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if !is_authorized(&headers, state.admin_token.as_deref()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    log::info!("Forced run requested over HTTP");
    let coordinator = state.coordinator.lock().await;
    match coordinator.run(true, Utc::now()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            log::error!("Forced run failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Run failed").into_response()
        }
    }
}

/// Without a configured token the endpoint is open
fn is_authorized(headers: &HeaderMap, token: Option<&str>) -> bool {
    let Some(token) = token else {
        return true;
    };
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|given| given == token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_open_without_token() {
        assert!(is_authorized(&HeaderMap::new(), None));
    }

    #[test]
    fn test_bearer_token_must_match() {
        assert!(is_authorized(&headers("Bearer s3cret"), Some("s3cret")));
        assert!(!is_authorized(&headers("Bearer wrong"), Some("s3cret")));
        assert!(!is_authorized(&headers("s3cret"), Some("s3cret")));
        assert!(!is_authorized(&HeaderMap::new(), Some("s3cret")));
    }
}
