pub mod clock;
pub mod models;
pub mod team_names;

pub use models::{MatchRecord, RuntimeConfig, TeamMap, TournamentSource};
pub use team_names::{PLACEHOLDER_TEAM, TeamNameNormalizer};
