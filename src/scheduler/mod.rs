mod poll_state;
mod selection;

pub use poll_state::{PollMode, PollPhase, PollState};
pub use selection::{Candidate, Cooldown, DueReason, Scheduler, Selection};
