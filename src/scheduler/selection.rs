use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::poll_state::{PollMode, PollState};
use crate::config::settings::SchedulerSettings;
use crate::domain::TournamentSource;
use crate::domain::clock::{local_date, local_date_of_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueReason {
    Forced,
    NeverPolled,
    /// Local calendar date changed since the last success
    DayRollover,
    Stale,
}

/// A tournament that should be fetched
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub slug: String,
    pub elapsed: Duration,
    pub reason: DueReason,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            DueReason::NeverPolled => write!(f, "{}(never)", self.slug),
            _ => write!(f, "{}({}m ago)", self.slug, self.elapsed.as_secs() / 60),
        }
    }
}

/// A tournament still inside its poll interval
#[derive(Debug, Clone, PartialEq)]
pub struct Cooldown {
    pub slug: String,
    pub remaining: Duration,
}

impl fmt::Display for Cooldown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(-{}m)", self.slug, self.remaining.as_secs().div_ceil(60))
    }
}

/// Result of one scheduling pass
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Fetched this run, most-starved first
    pub batch: Vec<Candidate>,
    /// Due but left for a later run
    pub deferred: Vec<Candidate>,
    pub cooling: Vec<Cooldown>,
}

impl Selection {
    /// Nothing due: the run does no network or aggregation work
    pub fn is_skip(&self) -> bool {
        self.batch.is_empty()
    }
}

pub struct Scheduler {
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(settings: SchedulerSettings) -> Self {
        Self { settings }
    }

    pub fn select(
        &self,
        now: DateTime<Utc>,
        tournaments: &[TournamentSource],
        states: &BTreeMap<String, PollState>,
        force: bool,
    ) -> Selection {
        let mut due = Vec::new();
        let mut cooling = Vec::new();

        for tournament in tournaments {
            let state = states.get(&tournament.slug).copied().unwrap_or_default();
            let elapsed = elapsed_since(now, state.last_success_ms);

            match self.due_reason(now, &state, elapsed, force) {
                Some(reason) => due.push(Candidate {
                    slug: tournament.slug.clone(),
                    elapsed,
                    reason,
                }),
                None => cooling.push(Cooldown {
                    slug: tournament.slug.clone(),
                    remaining: self.threshold(state.mode()).saturating_sub(elapsed),
                }),
            }
        }

        // Stable sort keeps configuration order among equally starved sources
        due.sort_by(|a, b| b.elapsed.cmp(&a.elapsed));

        let batch_size = self.batch_size(tournaments.len());
        let deferred = if due.len() > batch_size {
            due.split_off(batch_size)
        } else {
            Vec::new()
        };

        Selection {
            batch: due,
            deferred,
            cooling,
        }
    }

    /// `ceil(total / rounds)`, never below one
    pub fn batch_size(&self, total: usize) -> usize {
        let rounds = self.settings.rounds.max(1);
        total.div_ceil(rounds).max(1)
    }

    fn due_reason(
        &self,
        now: DateTime<Utc>,
        state: &PollState,
        elapsed: Duration,
        force: bool,
    ) -> Option<DueReason> {
        if force {
            return Some(DueReason::Forced);
        }
        if !state.has_succeeded() {
            return Some(DueReason::NeverPolled);
        }
        // Full dates, not day-of-month: a source untouched for a month
        // must not look like "same day"
        if local_date_of_millis(state.last_success_ms) != Some(local_date(now)) {
            return Some(DueReason::DayRollover);
        }
        if elapsed >= self.threshold(state.mode()) {
            return Some(DueReason::Stale);
        }
        None
    }

    fn threshold(&self, mode: PollMode) -> Duration {
        match mode {
            PollMode::Fast => self.settings.fast_interval,
            PollMode::Slow => self.settings.slow_interval,
        }
    }
}

fn elapsed_since(now: DateTime<Utc>, last_success_ms: i64) -> Duration {
    let elapsed_ms = now.timestamp_millis().saturating_sub(last_success_ms);
    Duration::from_millis(elapsed_ms.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::PollPhase;
    use chrono::TimeZone;

    fn tournaments(count: usize) -> Vec<TournamentSource> {
        (0..count)
            .map(|i| TournamentSource {
                slug: format!("t{}", i),
                title: format!("Tournament {}", i),
                region: "LCK".to_string(),
                overview_pages: vec![format!("Page {}", i)],
            })
            .collect()
    }

    fn scheduler(rounds: usize) -> Scheduler {
        Scheduler::new(SchedulerSettings {
            rounds,
            ..SchedulerSettings::default()
        })
    }

    // 2026-03-02 12:00 local (04:00 UTC)
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 4, 0, 0).unwrap()
    }

    fn minutes_ago(minutes: i64) -> i64 {
        now().timestamp_millis() - minutes * 60_000
    }

    fn states(entries: &[(&str, i64, PollPhase)]) -> BTreeMap<String, PollState> {
        entries
            .iter()
            .map(|(slug, at, phase)| (slug.to_string(), PollState::new(*at, *phase)))
            .collect()
    }

    #[test]
    fn test_single_round_takes_everything() {
        let selection = scheduler(1).select(now(), &tournaments(10), &BTreeMap::new(), false);
        assert_eq!(selection.batch.len(), 10);
        assert!(selection.deferred.is_empty());
    }

    #[test]
    fn test_two_rounds_defer_half_longest_waiting_first() {
        let sources = tournaments(10);
        let entries: Vec<(String, i64, PollPhase)> = (0..10)
            .map(|i| (format!("t{}", i), minutes_ago(10 + i as i64 * 5), PollPhase::Ongoing))
            .collect();
        let states = entries
            .iter()
            .map(|(slug, at, phase)| (slug.clone(), PollState::new(*at, *phase)))
            .collect();

        let selection = scheduler(2).select(now(), &sources, &states, false);

        let batch: Vec<&str> = selection.batch.iter().map(|c| c.slug.as_str()).collect();
        let deferred: Vec<&str> = selection.deferred.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(batch, vec!["t9", "t8", "t7", "t6", "t5"]);
        assert_eq!(deferred, vec!["t4", "t3", "t2", "t1", "t0"]);
    }

    #[test]
    fn test_fast_and_slow_thresholds() {
        let sources = tournaments(3);
        let states = states(&[
            ("t0", minutes_ago(5), PollPhase::Ongoing),
            ("t1", minutes_ago(9), PollPhase::Verifying),
            ("t2", minutes_ago(30), PollPhase::Dormant),
        ]);

        let selection = scheduler(1).select(now(), &sources, &states, false);

        let batch: Vec<&str> = selection.batch.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(batch, vec!["t1"]);
        assert_eq!(selection.batch[0].reason, DueReason::Stale);

        let cooling: Vec<String> = selection.cooling.iter().map(|c| c.to_string()).collect();
        assert_eq!(cooling, vec!["t0(-3m)".to_string(), "t2(-30m)".to_string()]);
    }

    #[test]
    fn test_force_makes_everything_due() {
        let sources = tournaments(2);
        let states = states(&[
            ("t0", minutes_ago(1), PollPhase::Dormant),
            ("t1", minutes_ago(1), PollPhase::Ongoing),
        ]);

        let selection = scheduler(1).select(now(), &sources, &states, true);
        assert_eq!(selection.batch.len(), 2);
        assert!(selection.batch.iter().all(|c| c.reason == DueReason::Forced));
    }

    #[test]
    fn test_day_rollover_wakes_dormant_tournament() {
        // 13 minutes ago was 23:47 local on the previous day
        let late_now = Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap();
        let last = late_now.timestamp_millis() - 13 * 60_000;
        let selection = scheduler(1).select(
            late_now,
            &tournaments(1),
            &states(&[("t0", last, PollPhase::Dormant)]),
            false,
        );

        assert_eq!(selection.batch.len(), 1);
        assert_eq!(selection.batch[0].reason, DueReason::DayRollover);
    }

    #[test]
    fn test_same_day_of_month_in_another_month_is_rollover() {
        // 2026-02-02 vs 2026-03-02: same day-of-month, different date
        let last = Utc.with_ymd_and_hms(2026, 2, 2, 3, 0, 0).unwrap().timestamp_millis();
        let selection = scheduler(1).select(
            now(),
            &tournaments(1),
            &states(&[("t0", last, PollPhase::Dormant)]),
            false,
        );

        assert_eq!(selection.batch[0].reason, DueReason::DayRollover);
    }

    #[test]
    fn test_nothing_due_is_skip() {
        let selection = scheduler(2).select(
            now(),
            &tournaments(1),
            &states(&[("t0", minutes_ago(1), PollPhase::Ongoing)]),
            false,
        );
        assert!(selection.is_skip());
        assert_eq!(selection.cooling.len(), 1);
    }

    #[test]
    fn test_never_polled_is_due_first() {
        let sources = tournaments(2);
        let states = states(&[("t0", minutes_ago(20), PollPhase::Ongoing)]);

        let selection = scheduler(1).select(now(), &sources, &states, false);
        assert_eq!(selection.batch[0].slug, "t1");
        assert_eq!(selection.batch[0].reason, DueReason::NeverPolled);
        assert_eq!(selection.batch[0].to_string(), "t1(never)");
    }

    #[test]
    fn test_batch_size_rounds_up() {
        assert_eq!(scheduler(2).batch_size(10), 5);
        assert_eq!(scheduler(3).batch_size(10), 4);
        assert_eq!(scheduler(4).batch_size(1), 1);
        assert_eq!(scheduler(0).batch_size(3), 3);
    }
}
