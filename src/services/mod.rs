pub mod coordinator;
pub mod export;
pub mod run_log;
pub mod server;

pub use coordinator::{Collaborators, RunCoordinator, RunOutcome, RunReport};
pub use run_log::RunLog;
