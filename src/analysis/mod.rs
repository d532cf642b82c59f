//! Full recompute of the derived state from raw match rows.

pub mod classify;
pub mod schedule;
pub mod team_stats;
pub mod time_grid;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::settings::AnalysisSettings;
use crate::domain::clock::{parse_upstream_datetime, to_local};
use crate::domain::{MatchRecord, TeamMap, TeamNameNormalizer, TournamentSource};
use crate::scheduler::{PollPhase, PollState};

pub use classify::{MatchOutcome, MatchState, classify};
pub use schedule::{ScheduleBuilder, ScheduleEntry, display_group};
pub use team_stats::{HistoryEntry, MatchResult, TeamStats};
pub use time_grid::{GridMatch, RegionGrid, SlotCell, TimeSlotGrid};

/// Row counts for one tournament
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentDigest {
    pub raw: usize,
    /// Finished matches that fed the counters
    pub processed: usize,
    /// Valid rows not finished yet
    pub pending: usize,
    /// Rows dropped for a missing team name
    pub skipped: usize,
    pub matches_today: usize,
    pub pending_today: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    /// Unfinished matches today
    Ongoing,
    /// Today's matches look done, awaiting a confirming poll
    Verifying,
    Finished,
    /// Nothing scheduled today
    Idle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Tournament slug -> team -> stats
    pub team_stats: BTreeMap<String, BTreeMap<String, TeamStats>>,
    pub time_grid: TimeSlotGrid,
    /// Finished matches across every tournament
    pub grand_total: u64,
    pub digests: BTreeMap<String, TournamentDigest>,
    /// Latest finished match, epoch milliseconds; 0 when none
    pub latest_match_ms: i64,
    pub statuses: BTreeMap<String, TournamentStatus>,
    pub status_summary: String,
    /// Local date "YYYY-MM-DD" -> matches
    pub schedule: BTreeMap<String, Vec<ScheduleEntry>>,
    pub next_poll_states: BTreeMap<String, PollState>,
}

/// Everything one aggregation pass reads
pub struct AnalysisInput<'a> {
    pub tournaments: &'a [TournamentSource],
    pub team_map: &'a TeamMap,
    pub raw_matches: &'a BTreeMap<String, Vec<MatchRecord>>,
    pub poll_states: &'a BTreeMap<String, PollState>,
    /// Slugs fetched successfully this run
    pub refreshed: &'a BTreeSet<String>,
    /// Local (UTC+8) reference date
    pub today: NaiveDate,
}

pub struct AnalysisEngine {
    settings: AnalysisSettings,
}

impl AnalysisEngine {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Pure function of its input: identical input gives identical output
    pub fn analyze(&self, input: &AnalysisInput<'_>) -> AnalysisResult {
        let normalizer = TeamNameNormalizer::new(input.team_map);
        let mut result = AnalysisResult {
            time_grid: TimeSlotGrid::with_regions(
                input.tournaments.iter().map(|t| t.region.as_str()),
                &self.settings.region_slots,
            ),
            ..Default::default()
        };
        let mut schedule = ScheduleBuilder::default();

        for (index, tournament) in input.tournaments.iter().enumerate() {
            let rows = input
                .raw_matches
                .get(&tournament.slug)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let mut pass = TournamentPass {
                index,
                tournament,
                slots: self.region_slots(&tournament.region),
                today: input.today,
                normalizer: &normalizer,
                teams: BTreeMap::new(),
                digest: TournamentDigest {
                    raw: rows.len(),
                    ..Default::default()
                },
                latest_match_ms: 0,
            };
            for (record, timestamp) in chronological(rows) {
                pass.process(record, timestamp, &mut result.time_grid, &mut schedule);
            }
            for stats in pass.teams.values_mut() {
                stats.sort_history();
            }

            let previous = input.poll_states.get(&tournament.slug).copied().unwrap_or_default();
            let next = previous.advance(
                input.refreshed.contains(&tournament.slug),
                pass.digest.pending_today > 0,
            );

            result.grand_total += pass.digest.processed as u64;
            result.latest_match_ms = result.latest_match_ms.max(pass.latest_match_ms);
            result
                .statuses
                .insert(tournament.slug.clone(), status_of(&pass.digest, next.phase));
            result.next_poll_states.insert(tournament.slug.clone(), next);
            result.digests.insert(tournament.slug.clone(), pass.digest);
            result.team_stats.insert(tournament.slug.clone(), pass.teams);
        }

        result.schedule = schedule.build(self.settings.schedule_days);
        result.status_summary = summarize(&result.statuses);
        result
    }

    fn region_slots(&self, region: &str) -> &[u32] {
        self.settings
            .region_slots
            .get(region)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

// --- Helper Methods ---

/// Per-tournament accumulator
struct TournamentPass<'a> {
    index: usize,
    tournament: &'a TournamentSource,
    slots: &'a [u32],
    today: NaiveDate,
    normalizer: &'a TeamNameNormalizer,
    teams: BTreeMap<String, TeamStats>,
    digest: TournamentDigest,
    latest_match_ms: i64,
}

impl TournamentPass<'_> {
    fn process(
        &mut self,
        record: &MatchRecord,
        timestamp: Option<DateTime<Utc>>,
        grid: &mut TimeSlotGrid,
        schedule: &mut ScheduleBuilder,
    ) {
        let team1 = self.normalizer.normalize(record.team1.as_deref());
        let team2 = self.normalizer.normalize(record.team2.as_deref());
        let (Some(team1), Some(team2)) = (team1, team2) else {
            self.digest.skipped += 1;
            return;
        };

        let outcome = classify(record);
        let local = timestamp.map(to_local);
        let timestamp_ms = timestamp.map(|t| t.timestamp_millis()).unwrap_or(0);
        let is_today = local.is_some_and(|l| l.date_naive() == self.today);

        if is_today {
            self.digest.matches_today += 1;
        }
        if outcome.is_finished() {
            self.digest.processed += 1;
        } else {
            self.digest.pending += 1;
            if is_today {
                self.digest.pending_today += 1;
            }
        }

        let date_label = local
            .map(|l| l.format("%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let score = format!("{}-{}", outcome.score1, outcome.score2);
        for (team, opponent, is_team1) in [(&team1, &team2, true), (&team2, &team1, false)] {
            self.team_mut(team).push_history(HistoryEntry {
                date: date_label.clone(),
                opponent: opponent.clone(),
                score: score.clone(),
                result: team_stats::result_for(&outcome, is_team1),
                best_of: outcome.best_of,
                full_length: outcome.full_length,
                timestamp_ms,
            });
        }

        if outcome.is_finished() {
            let team1_won = outcome.team1_won();
            self.team_mut(&team1)
                .record_series(outcome.score1, &outcome, team1_won, timestamp_ms);
            self.team_mut(&team2)
                .record_series(outcome.score2, &outcome, !team1_won, timestamp_ms);
            self.latest_match_ms = self.latest_match_ms.max(timestamp_ms);

            if let Some(local) = local {
                grid.record(
                    &self.tournament.region,
                    self.slots,
                    local.hour(),
                    local.weekday().num_days_from_monday() as usize,
                    &GridMatch {
                        date: local.format("%m-%d").to_string(),
                        team1: team1.clone(),
                        team2: team2.clone(),
                        score: score.clone(),
                        full_length: outcome.full_length,
                    },
                );
            }
        }

        if let Some(local) = local.filter(|l| l.date_naive() >= self.today) {
            schedule.add(
                local.date_naive(),
                ScheduleEntry {
                    time: local.format("%H:%M").to_string(),
                    team1,
                    team2,
                    score1: outcome.score1,
                    score2: outcome.score2,
                    best_of: outcome.best_of,
                    finished: outcome.is_finished(),
                    live: outcome.is_live(),
                    region: self.tournament.region.clone(),
                    tournament: self.tournament.slug.clone(),
                    tournament_index: self.index,
                    group: display_group(record.tab.as_deref(), record.round.as_deref()),
                },
            );
        }
    }

    fn team_mut(&mut self, name: &str) -> &mut TeamStats {
        self.teams
            .entry(name.to_string())
            .or_insert_with(|| TeamStats::new(name))
    }
}

/// Rows in kick-off order so streaks follow the calendar; undated rows last.
/// Stable, so rows with equal times keep their fetched order.
fn chronological(
    rows: &[MatchRecord],
) -> Vec<(&MatchRecord, Option<DateTime<Utc>>)> {
    let mut ordered: Vec<_> = rows
        .iter()
        .map(|row| {
            let timestamp = row.datetime_utc.as_deref().and_then(parse_upstream_datetime);
            (row, timestamp)
        })
        .collect();
    ordered.sort_by_key(|(_, timestamp)| (timestamp.is_none(), *timestamp));
    ordered
}

fn status_of(digest: &TournamentDigest, next_phase: PollPhase) -> TournamentStatus {
    if digest.pending_today > 0 {
        TournamentStatus::Ongoing
    } else if digest.matches_today == 0 {
        TournamentStatus::Idle
    } else if next_phase == PollPhase::Dormant {
        TournamentStatus::Finished
    } else {
        TournamentStatus::Verifying
    }
}

/// "2 ongoing, 1 idle"; "no tournaments" when empty
fn summarize(statuses: &BTreeMap<String, TournamentStatus>) -> String {
    let order = [
        (TournamentStatus::Ongoing, "ongoing"),
        (TournamentStatus::Verifying, "verifying"),
        (TournamentStatus::Finished, "finished"),
        (TournamentStatus::Idle, "idle"),
    ];
    let parts: Vec<String> = order
        .iter()
        .filter_map(|(status, label)| {
            let count = statuses.values().filter(|s| *s == status).count();
            (count > 0).then(|| format!("{} {}", count, label))
        })
        .collect();

    if parts.is_empty() {
        "no tournaments".to_string()
    } else {
        parts.join(", ")
    }
}
