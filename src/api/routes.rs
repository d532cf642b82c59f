use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::handlers::{
    AppState,
    admin::force_run,
    reports::{get_analysis, get_logs, get_poll_states, health},
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/force", post(force_run))
        .route("/api/logs", get(get_logs))
        .route("/api/analysis", get(get_analysis))
        .route("/api/poll-states", get(get_poll_states))
        .route("/api/health", get(health))
        .with_state(state)
}
