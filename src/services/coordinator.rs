use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use super::run_log::RunLog;
use crate::analysis::{AnalysisEngine, AnalysisInput, AnalysisResult};
use crate::api::auth::{AuthProvider, build_auth_provider};
use crate::api::cargo_client::CargoClient;
use crate::config::settings::AppConfig;
use crate::config::{ConfigSource, build_config_source};
use crate::database::{LogEntry, PersistedState, StateCommit, StateStore};
use crate::domain::clock::local_date;
use crate::domain::{MatchRecord, RuntimeConfig};
use crate::fetch::{FetchExecutor, MatchPageSource};
use crate::http::Session;
use crate::rate_limiter::RateLimiter;
use crate::scheduler::{PollState, Scheduler, Selection};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    Committed {
        refreshed: usize,
        failed: usize,
        grand_total: u64,
    },
    /// Nothing was due
    Skipped,
    ConfigUnavailable,
    /// Every fetch in the batch failed
    NothingFetched { failed: usize },
    /// The new total regressed too far below the previous one
    RolledBack { previous: u64, computed: u64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub forced: bool,
    pub outcome: RunOutcome,
    pub batch: Vec<String>,
    pub deferred: Vec<String>,
    pub failures: Vec<String>,
    pub entries: Vec<LogEntry>,
}

impl RunReport {
    pub fn committed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Committed { .. })
    }
}

/// External collaborators of a run
pub struct Collaborators {
    pub config_source: Box<dyn ConfigSource>,
    pub auth: Box<dyn AuthProvider>,
    pub pages: Arc<dyn MatchPageSource>,
    pub store: Arc<dyn StateStore>,
}

/// Drives one poll cycle from scheduling to persistence
pub struct RunCoordinator {
    config_source: Box<dyn ConfigSource>,
    auth: Box<dyn AuthProvider>,
    executor: FetchExecutor,
    store: Arc<dyn StateStore>,
    scheduler: Scheduler,
    engine: AnalysisEngine,
    tournament_delay: Duration,
}

/// Fetch results of one batch
struct BatchOutcome {
    fetched: BTreeMap<String, Vec<MatchRecord>>,
    failures: Vec<String>,
}

impl RunCoordinator {
    pub fn new(collaborators: Collaborators, config: &AppConfig) -> Self {
        Self {
            config_source: collaborators.config_source,
            auth: collaborators.auth,
            executor: FetchExecutor::from_settings(collaborators.pages, &config.fetch),
            store: collaborators.store,
            scheduler: Scheduler::new(config.scheduler.clone()),
            engine: AnalysisEngine::new(config.analysis.clone()),
            tournament_delay: config.fetch.tournament_delay,
        }
    }

    pub fn from_config(config: &AppConfig, store: Arc<dyn StateStore>) -> Result<Self> {
        let collaborators = Collaborators {
            config_source: build_config_source(config)?,
            auth: build_auth_provider(&config.auth, &config.fetch)?,
            pages: Arc::new(CargoClient::new(&config.fetch)?),
            store,
        };
        Ok(Self::new(collaborators, config))
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// One complete cycle. Only store failures surface as `Err`; every other
    /// failure is reported through the returned `RunReport`.
    pub async fn run(&self, force: bool, now: DateTime<Utc>) -> Result<RunReport> {
        let mut run_log = RunLog::new(now);
        let mut report = RunReport {
            started_at: now,
            forced: force,
            outcome: RunOutcome::Skipped,
            batch: Vec::new(),
            deferred: Vec::new(),
            failures: Vec::new(),
            entries: Vec::new(),
        };

        let outcome = self.execute(force, now, &mut run_log, &mut report).await;
        if let Err(e) = &outcome {
            run_log.error(format!("Run aborted: {:#}", e));
        }

        report.entries = run_log.into_entries();
        if let Err(e) = self.store.append_logs(&report.entries) {
            warn!("Failed to persist run log: {:#}", e);
        }
        report.outcome = outcome?;
        Ok(report)
    }

    async fn execute(
        &self,
        force: bool,
        now: DateTime<Utc>,
        run_log: &mut RunLog,
        report: &mut RunReport,
    ) -> Result<RunOutcome> {
        let config = match self.config_source.load().await {
            Ok(config) => config,
            Err(e) => {
                run_log.error(format!("Config unavailable: {}", e));
                return Ok(RunOutcome::ConfigUnavailable);
            }
        };

        let state = self.store.load_state()?;
        let selection = self
            .scheduler
            .select(now, &config.tournaments, &state.poll_states, force);
        report.batch = selection.batch.iter().map(|c| c.slug.clone()).collect();
        report.deferred = selection.deferred.iter().map(|c| c.slug.clone()).collect();

        if selection.is_skip() {
            run_log.info(format!("Skipped, all cooling: {}", join(&selection.cooling)));
            return Ok(RunOutcome::Skipped);
        }
        run_log.info(describe_selection(&selection, force));

        let session = self.login(run_log).await;
        let batch = self
            .fetch_batch(&config, &selection, session.as_ref(), run_log)
            .await;
        report.failures = batch.failures.clone();

        if batch.fetched.is_empty() {
            run_log.error(format!(
                "No tournament fetched ({} failed), keeping previous state",
                batch.failures.len()
            ));
            return Ok(RunOutcome::NothingFetched {
                failed: batch.failures.len(),
            });
        }

        let previous_total = state.grand_total;
        let refreshed: BTreeSet<String> = batch.fetched.keys().cloned().collect();
        let (raw_matches, poll_states) = merge(state, batch.fetched, now);
        let analysis = self.engine.analyze(&AnalysisInput {
            tournaments: &config.tournaments,
            team_map: &config.team_map,
            raw_matches: &raw_matches,
            poll_states: &poll_states,
            refreshed: &refreshed,
            today: local_date(now),
        });

        if let Some(outcome) = self.check_rollback(previous_total, &analysis, force, run_log) {
            return Ok(outcome);
        }

        self.store.commit(&StateCommit {
            raw_matches: &raw_matches,
            poll_states: &analysis.next_poll_states,
            analysis: &analysis,
            committed_at: now,
        })?;

        run_log.success(format!(
            "Updated {}/{} tournaments, {} finished matches ({})",
            refreshed.len(),
            selection.batch.len(),
            analysis.grand_total,
            analysis.status_summary
        ));
        Ok(RunOutcome::Committed {
            refreshed: refreshed.len(),
            failed: batch.failures.len(),
            grand_total: analysis.grand_total,
        })
    }

    // --- Helper Methods ---

    async fn login(&self, run_log: &mut RunLog) -> Option<Session> {
        match self.auth.session().await {
            Ok(Some(session)) => {
                debug!("Using authenticated session");
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                run_log.error(format!("Auth failed, continuing anonymously: {}", e));
                None
            }
        }
    }

    async fn fetch_batch(
        &self,
        config: &RuntimeConfig,
        selection: &Selection,
        session: Option<&Session>,
        run_log: &mut RunLog,
    ) -> BatchOutcome {
        let mut limiter = RateLimiter::new(self.tournament_delay);
        let mut outcome = BatchOutcome {
            fetched: BTreeMap::new(),
            failures: Vec::new(),
        };

        for candidate in &selection.batch {
            let Some(tournament) = config.tournaments.iter().find(|t| t.slug == candidate.slug) else {
                continue;
            };

            limiter.wait().await;
            match self.executor.fetch_tournament(tournament, session).await {
                Ok(rows) => {
                    outcome.fetched.insert(tournament.slug.clone(), rows);
                }
                Err(e) => {
                    run_log.error(e.to_string());
                    outcome.failures.push(tournament.slug.clone());
                }
            }
        }

        outcome
    }

    fn check_rollback(
        &self,
        previous_total: u64,
        analysis: &AnalysisResult,
        force: bool,
        run_log: &mut RunLog,
    ) -> Option<RunOutcome> {
        let floor = previous_total as f64 * self.engine.settings().rollback_ratio;
        if force || previous_total == 0 || analysis.grand_total as f64 >= floor {
            return None;
        }

        run_log.error(format!(
            "Data anomaly: finished matches dropped from {} to {}, discarding run",
            previous_total, analysis.grand_total
        ));
        Some(RunOutcome::RolledBack {
            previous: previous_total,
            computed: analysis.grand_total,
        })
    }
}

/// Replace the raw rows of every fetched tournament and stamp its success time
fn merge(
    state: PersistedState,
    fetched: BTreeMap<String, Vec<MatchRecord>>,
    now: DateTime<Utc>,
) -> (BTreeMap<String, Vec<MatchRecord>>, BTreeMap<String, PollState>) {
    let PersistedState {
        mut raw_matches,
        mut poll_states,
        ..
    } = state;

    for (slug, rows) in fetched {
        let previous = poll_states.get(&slug).copied().unwrap_or_default();
        poll_states.insert(slug.clone(), previous.with_success_at(now.timestamp_millis()));
        raw_matches.insert(slug, rows);
    }

    (raw_matches, poll_states)
}

fn describe_selection(selection: &Selection, force: bool) -> String {
    let mut message = format!(
        "{}: {}",
        if force { "Forced batch" } else { "Batch" },
        join(&selection.batch)
    );
    if !selection.deferred.is_empty() {
        message.push_str(&format!(" | deferred: {}", join(&selection.deferred)));
    }
    message
}

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
