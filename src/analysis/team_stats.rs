use serde::{Deserialize, Serialize};

use super::classify::{MatchOutcome, MatchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Live,
    Pending,
}

/// One line of a team's schedule, seen from that team's side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Local "MM-DD HH:MM", or "-" when the match has no date
    pub date: String,
    pub opponent: String,
    pub score: String,
    pub result: MatchResult,
    pub best_of: u32,
    pub full_length: bool,
    /// Epoch milliseconds; 0 when undated
    pub timestamp_ms: i64,
}

/// Running statistics for one team within one tournament
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub name: String,
    pub bo3_full: u32,
    pub bo3_total: u32,
    pub bo5_full: u32,
    pub bo5_total: u32,
    pub series_won: u32,
    pub series_total: u32,
    pub games_won: u32,
    pub games_total: u32,
    pub win_streak: u32,
    pub loss_streak: u32,
    /// Latest finished match, epoch milliseconds; 0 when none
    pub last_match_ms: i64,
    /// Most recent first
    pub history: Vec<HistoryEntry>,
}

impl TeamStats {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    /// Fold one finished series into the counters
    pub fn record_series(&mut self, games_won: u32, outcome: &MatchOutcome, won: bool, timestamp_ms: i64) {
        self.series_total += 1;
        self.games_total = self
            .games_total
            .saturating_add(outcome.score1.saturating_add(outcome.score2));
        self.games_won = self.games_won.saturating_add(games_won);

        match outcome.best_of {
            3 => {
                self.bo3_total += 1;
                self.bo3_full += u32::from(outcome.full_length);
            }
            5 => {
                self.bo5_total += 1;
                self.bo5_full += u32::from(outcome.full_length);
            }
            _ => {}
        }

        if won {
            self.series_won += 1;
            self.extend_win_streak();
        } else {
            self.extend_loss_streak();
        }

        self.last_match_ms = self.last_match_ms.max(timestamp_ms);
    }

    pub fn sort_history(&mut self) {
        self.history.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    }

    fn extend_win_streak(&mut self) {
        if self.loss_streak > 0 {
            self.loss_streak = 0;
            self.win_streak = 1;
        } else {
            self.win_streak += 1;
        }
    }

    fn extend_loss_streak(&mut self) {
        if self.win_streak > 0 {
            self.win_streak = 0;
            self.loss_streak = 1;
        } else {
            self.loss_streak += 1;
        }
    }
}

/// Result of a row from one side's perspective
pub fn result_for(outcome: &MatchOutcome, is_team1: bool) -> MatchResult {
    match outcome.state {
        MatchState::Finished if outcome.team1_won() == is_team1 => MatchResult::Win,
        MatchState::Finished => MatchResult::Loss,
        MatchState::Live => MatchResult::Live,
        MatchState::NotStarted => MatchResult::Pending,
    }
}
