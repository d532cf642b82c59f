use crate::domain::MatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    NotStarted,
    Live,
    Finished,
}

/// Scores and completion state of one raw row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub score1: u32,
    pub score2: u32,
    pub best_of: u32,
    pub state: MatchState,
    pub full_length: bool,
}

impl MatchOutcome {
    pub fn is_finished(&self) -> bool {
        self.state == MatchState::Finished
    }

    pub fn is_live(&self) -> bool {
        self.state == MatchState::Live
    }

    pub fn team1_won(&self) -> bool {
        self.score1 > self.score2
    }
}

pub fn classify(record: &MatchRecord) -> MatchOutcome {
    let score1 = record.score1();
    let score2 = record.score2();
    let best_of = record.best_of();

    let state = if is_decided(best_of, score1, score2) {
        MatchState::Finished
    } else if score1 > 0 || score2 > 0 || record.has_reported_score() {
        MatchState::Live
    } else {
        MatchState::NotStarted
    };

    MatchOutcome {
        score1,
        score2,
        best_of,
        state,
        full_length: state == MatchState::Finished && is_full_length(best_of, score1.min(score2)),
    }
}

/// One side reached the majority of `best_of`; level scores are never decided
fn is_decided(best_of: u32, score1: u32, score2: u32) -> bool {
    score1 != score2 && score1.max(score2) >= best_of.div_ceil(2)
}

/// The loser took every game short of the decider
pub fn is_full_length(best_of: u32, loser_score: u32) -> bool {
    match best_of {
        3 | 5 => loser_score == (best_of - 1) / 2,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score1: &str, score2: &str, best_of: &str) -> MatchRecord {
        MatchRecord {
            team1: Some("A".to_string()),
            team2: Some("B".to_string()),
            team1_score: Some(score1.to_string()),
            team2_score: Some(score2.to_string()),
            best_of: Some(best_of.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_length_classification() {
        assert!(classify(&record("2", "1", "3")).full_length);
        assert!(!classify(&record("2", "0", "3")).full_length);
        assert!(classify(&record("3", "2", "5")).full_length);
        assert!(!classify(&record("1", "3", "5")).full_length);
    }

    #[test]
    fn test_finished_needs_majority() {
        assert!(classify(&record("2", "0", "3")).is_finished());
        assert!(!classify(&record("2", "1", "5")).is_finished());
        assert!(classify(&record("1", "0", "1")).is_finished());
    }

    #[test]
    fn test_live_includes_reported_zero() {
        assert!(classify(&record("0", "0", "3")).is_live());
        assert!(classify(&record("1", "1", "3")).is_live());
        assert!(!classify(&record("1", "1", "3")).full_length);
    }

    #[test]
    fn test_unplayed_match_not_started() {
        let outcome = classify(&record("", "", ""));
        assert_eq!(outcome.state, MatchState::NotStarted);
        assert_eq!(outcome.best_of, 3);
    }

    #[test]
    fn test_missing_scores_not_started() {
        let outcome = classify(&MatchRecord::default());
        assert_eq!(outcome.state, MatchState::NotStarted);
    }
}
