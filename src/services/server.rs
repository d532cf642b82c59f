use anyhow::Result;
use chrono::Utc;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tower_http::cors::CorsLayer;

use super::coordinator::{RunCoordinator, RunOutcome};
use crate::api::handlers::AppState;
use crate::api::routes::create_router;

/// HTTP API plus the periodic poll loop
pub struct ServerService {
    port: u16,
    tick: Duration,
    state: Arc<AppState>,
}

impl ServerService {
    pub fn new(port: u16, tick: Duration, coordinator: RunCoordinator, admin_token: Option<String>) -> Self {
        Self {
            port,
            tick,
            state: AppState::new(coordinator, admin_token),
        }
    }

    pub async fn run(&self) -> Result<()> {
        tokio::spawn(tick_loop(self.state.clone(), self.tick));

        let app = create_router(self.state.clone()).layer(CorsLayer::permissive());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn tick_loop(state: Arc<AppState>, tick: Duration) {
    let mut ticker = interval(tick.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Polling every {:?}", tick);

    loop {
        ticker.tick().await;
        let coordinator = state.coordinator.lock().await;
        match coordinator.run(false, Utc::now()).await {
            Ok(report) if report.outcome == RunOutcome::Skipped => {
                log::debug!("Tick skipped, nothing due");
            }
            Ok(report) => info!("Tick finished: {:?}", report.outcome),
            Err(e) => error!("Tick failed: {:#}", e),
        }
    }
}
