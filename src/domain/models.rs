use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Tournament tracked by the poller, as listed in `tournaments.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TournamentSource {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    pub region: String,
    /// Upstream page identifiers; each is queried as a prefix match
    #[serde(alias = "overview_page", deserialize_with = "one_or_many")]
    pub overview_pages: Vec<String>,
}

/// Team alias map from `teams.json`: alias substring -> canonical short name
pub type TeamMap = BTreeMap<String, String>;

/// Everything the configuration collaborator hands to a run
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub tournaments: Vec<TournamentSource>,
    pub team_map: TeamMap,
}


// --- Upstream Row Structures ---

/// Raw match row from the MatchSchedule cargo table.
///
/// The endpoint returns every value as a string (or null), and older
/// responses use spaced field names, so all fields are lenient.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchRecord {
    #[serde(rename = "Team1", alias = "Team 1", default, deserialize_with = "lenient_string")]
    pub team1: Option<String>,
    #[serde(rename = "Team2", alias = "Team 2", default, deserialize_with = "lenient_string")]
    pub team2: Option<String>,
    #[serde(rename = "Team1Score", alias = "Team 1 Score", default, deserialize_with = "lenient_string")]
    pub team1_score: Option<String>,
    #[serde(rename = "Team2Score", alias = "Team 2 Score", default, deserialize_with = "lenient_string")]
    pub team2_score: Option<String>,
    #[serde(rename = "BestOf", alias = "Best Of", default, deserialize_with = "lenient_string")]
    pub best_of: Option<String>,
    #[serde(rename = "DateTime_UTC", alias = "DateTime UTC", default, deserialize_with = "lenient_string")]
    pub datetime_utc: Option<String>,
    #[serde(rename = "OverviewPage", alias = "Overview Page", default, deserialize_with = "lenient_string")]
    pub overview_page: Option<String>,
    #[serde(rename = "N_MatchInPage", alias = "N MatchInPage", default, deserialize_with = "lenient_string")]
    pub match_in_page: Option<String>,
    #[serde(rename = "Tab", default, deserialize_with = "lenient_string")]
    pub tab: Option<String>,
    #[serde(rename = "Round", default, deserialize_with = "lenient_string")]
    pub round: Option<String>,
}

impl MatchRecord {
    /// Games won by team 1, capped at the series length
    pub fn score1(&self) -> u32 {
        parse_score(self.team1_score.as_deref()).min(self.best_of())
    }

    pub fn score2(&self) -> u32 {
        parse_score(self.team2_score.as_deref()).min(self.best_of())
    }

    /// Upstream sends "" for unplayed matches; anything else counts as reported
    pub fn has_reported_score(&self) -> bool {
        self.team1_score
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// Best-of length, falling back to 3 when missing or not a positive number
    pub fn best_of(&self) -> u32 {
        self.best_of
            .as_deref()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|bo| *bo > 0)
            .unwrap_or(3)
    }
}

fn parse_score(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(page) => vec![page],
        OneOrMany::Many(pages) => pages,
    })
}
