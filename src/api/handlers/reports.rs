use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::AppState;
use crate::scheduler::{PollMode, PollPhase, PollState};

const DEFAULT_LOG_LIMIT: usize = 50;
const MAX_LOG_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct LogParams {
    pub limit: Option<usize>,
}

/// Poll state with its derived fields spelled out
#[derive(Debug, Serialize, PartialEq)]
pub struct PollStateView {
    pub last_success_ms: i64,
    pub phase: PollPhase,
    pub mode: PollMode,
    pub streak: u8,
}

impl From<PollState> for PollStateView {
    fn from(state: PollState) -> Self {
        Self {
            last_success_ms: state.last_success_ms,
            phase: state.phase,
            mode: state.mode(),
            streak: state.streak(),
        }
    }
}

pub async fn get_logs(State(state): State<Arc<AppState>>, Query(params): Query<LogParams>) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);

    match state.store.recent_logs(limit) {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => internal_error("logs", e),
    }
}

pub async fn get_analysis(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.load_analysis() {
        Ok(Some(analysis)) => Json(analysis).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "No analysis committed yet").into_response(),
        Err(e) => internal_error("analysis", e),
    }
}

pub async fn get_poll_states(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.load_state() {
        Ok(persisted) => {
            let views: BTreeMap<String, PollStateView> = persisted
                .poll_states
                .into_iter()
                .map(|(slug, poll_state)| (slug, poll_state.into()))
                .collect();
            Json(views).into_response()
        }
        Err(e) => internal_error("poll states", e),
    }
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn internal_error(what: &str, error: anyhow::Error) -> axum::response::Response {
    log::error!("Failed to load {}: {:#}", what, error);
    (StatusCode::INTERNAL_SERVER_ERROR, "DB Error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_state_view_spells_out_mode() {
        let view = PollStateView::from(PollState::new(9, PollPhase::Dormant));
        assert_eq!(view.mode, PollMode::Slow);
        assert_eq!(view.streak, 2);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["mode"], "slow");
        assert_eq!(json["phase"], "dormant");
    }
}
