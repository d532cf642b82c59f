use std::sync::Arc;
use tokio::sync::Mutex;

use crate::database::StateStore;
use crate::services::coordinator::RunCoordinator;

pub mod admin;
pub mod reports;

/// Shared by every handler and the tick loop
pub struct AppState {
    /// Held for the whole run, so runs never overlap
    pub coordinator: Mutex<RunCoordinator>,
    pub store: Arc<dyn StateStore>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(coordinator: RunCoordinator, admin_token: Option<String>) -> Arc<Self> {
        let store = coordinator.store().clone();
        Arc::new(Self {
            coordinator: Mutex::new(coordinator),
            store,
            admin_token,
        })
    }
}
