use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Transaction, params};
use std::collections::BTreeMap;

use super::connection::{DbConn, DbPool, create_pool, get_connection};
use super::models::{LogEntry, PersistedState, Severity, StateCommit};
use super::setup::ensure_schema;
use crate::analysis::AnalysisResult;
use crate::config::settings::StoreSettings;
use crate::domain::MatchRecord;
use crate::scheduler::{PollPhase, PollState};

/// Durable state shared between runs
pub trait StateStore: Send + Sync {
    fn load_state(&self) -> Result<PersistedState>;

    /// Writes raw rows, poll states and the analysis snapshot together or not at all
    fn commit(&self, commit: &StateCommit<'_>) -> Result<()>;

    fn load_analysis(&self) -> Result<Option<AnalysisResult>>;

    /// Appends in order; the oldest entries beyond capacity are dropped
    fn append_logs(&self, entries: &[LogEntry]) -> Result<()>;

    /// Newest first
    fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>>;
}

pub struct SqliteStateStore {
    pool: DbPool,
    log_capacity: usize,
}

impl SqliteStateStore {
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        let pool = create_pool(&settings.database_path)?;
        let mut conn = get_connection(&pool)?;
        ensure_schema(&mut conn)?;

        log::debug!("Opened state store at {}", settings.database_path);
        Ok(Self {
            pool,
            log_capacity: settings.log_capacity.max(1),
        })
    }

    fn connection(&self) -> Result<DbConn> {
        get_connection(&self.pool)
    }

    // --- Helper Methods ---

    fn load_raw_matches(conn: &DbConn) -> Result<BTreeMap<String, Vec<MatchRecord>>> {
        let mut stmt = conn
            .prepare("SELECT slug, rows_json FROM raw_matches ORDER BY slug")
            .context("Failed to prepare raw match query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .context("Failed to query raw matches")?;

        let mut raw_matches = BTreeMap::new();
        for row in rows {
            let (slug, json) = row.context("Failed to read raw match row")?;
            let records: Vec<MatchRecord> = serde_json::from_str(&json)
                .with_context(|| format!("Corrupt raw matches for {}", slug))?;
            raw_matches.insert(slug, records);
        }
        Ok(raw_matches)
    }

    fn load_poll_states(conn: &DbConn) -> Result<BTreeMap<String, PollState>> {
        let mut stmt = conn
            .prepare("SELECT slug, last_success_ms, streak FROM poll_states ORDER BY slug")
            .context("Failed to prepare poll state query")?;
        let rows = stmt
            .query_map([], |row| {
                let slug: String = row.get(0)?;
                let last_success_ms: i64 = row.get(1)?;
                let streak: u8 = row.get(2)?;
                Ok((slug, PollState::new(last_success_ms, PollPhase::from_streak(streak))))
            })
            .context("Failed to query poll states")?;

        rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()
            .context("Failed to read poll state row")
    }

    fn load_grand_total(conn: &DbConn) -> Result<u64> {
        let total: Option<i64> = conn
            .query_row("SELECT grand_total FROM snapshot WHERE id = 1", [], |row| row.get(0))
            .optional()
            .context("Failed to query grand total")?;
        Ok(total.unwrap_or(0).max(0) as u64)
    }

    fn write_raw_matches(
        tx: &Transaction<'_>,
        raw_matches: &BTreeMap<String, Vec<MatchRecord>>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO raw_matches (slug, rows_json, row_count, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(slug) DO UPDATE SET rows_json = excluded.rows_json, row_count = excluded.row_count, updated_at = excluded.updated_at",
        )?;
        for (slug, records) in raw_matches {
            let json = serde_json::to_string(records)
                .with_context(|| format!("Failed to serialize raw matches for {}", slug))?;
            stmt.execute(params![slug, json, records.len() as i64, at])
                .with_context(|| format!("Failed to store raw matches for {}", slug))?;
        }
        Ok(())
    }

    fn write_poll_states(tx: &Transaction<'_>, poll_states: &BTreeMap<String, PollState>) -> Result<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO poll_states (slug, last_success_ms, mode, streak) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(slug) DO UPDATE SET last_success_ms = excluded.last_success_ms, mode = excluded.mode, streak = excluded.streak",
        )?;
        for (slug, state) in poll_states {
            stmt.execute(params![slug, state.last_success_ms, state.mode().as_str(), state.streak()])
                .with_context(|| format!("Failed to store poll state for {}", slug))?;
        }
        Ok(())
    }

    fn write_snapshot(tx: &Transaction<'_>, analysis: &AnalysisResult, at: DateTime<Utc>) -> Result<()> {
        let json = serde_json::to_string(analysis).context("Failed to serialize analysis")?;
        tx.execute(
            "INSERT INTO snapshot (id, grand_total, analysis_json, committed_at) VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET grand_total = excluded.grand_total, analysis_json = excluded.analysis_json, committed_at = excluded.committed_at",
            params![analysis.grand_total as i64, json, at],
        )
        .context("Failed to store analysis snapshot")?;
        Ok(())
    }
}

impl StateStore for SqliteStateStore {
    fn load_state(&self) -> Result<PersistedState> {
        let conn = self.connection()?;
        Ok(PersistedState {
            raw_matches: Self::load_raw_matches(&conn)?,
            poll_states: Self::load_poll_states(&conn)?,
            grand_total: Self::load_grand_total(&conn)?,
        })
    }

    fn commit(&self, commit: &StateCommit<'_>) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().context("Failed to begin commit")?;

        Self::write_raw_matches(&tx, commit.raw_matches, commit.committed_at)?;
        Self::write_poll_states(&tx, commit.poll_states)?;
        Self::write_snapshot(&tx, commit.analysis, commit.committed_at)?;

        tx.commit().context("Failed to commit state")?;
        log::debug!(
            "Committed state: {} tournaments, grand total {}",
            commit.raw_matches.len(),
            commit.analysis.grand_total
        );
        Ok(())
    }

    fn load_analysis(&self) -> Result<Option<AnalysisResult>> {
        let conn = self.connection()?;
        let json: Option<String> = conn
            .query_row("SELECT analysis_json FROM snapshot WHERE id = 1", [], |row| row.get(0))
            .optional()
            .context("Failed to query analysis snapshot")?;

        json.map(|json| serde_json::from_str(&json).context("Corrupt analysis snapshot"))
            .transpose()
    }

    fn append_logs(&self, entries: &[LogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection()?;
        let tx = conn.transaction().context("Failed to begin log append")?;
        {
            let mut stmt = tx.prepare("INSERT INTO run_log (at, level, message) VALUES (?1, ?2, ?3)")?;
            for entry in entries {
                stmt.execute(params![entry.at, entry.level.as_str(), entry.message])
                    .context("Failed to append run log entry")?;
            }
        }
        tx.execute(
            "DELETE FROM run_log WHERE id NOT IN (SELECT id FROM run_log ORDER BY id DESC LIMIT ?1)",
            params![self.log_capacity as i64],
        )
        .context("Failed to trim run log")?;
        tx.commit().context("Failed to commit run log")?;
        Ok(())
    }

    fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT at, level, message FROM run_log ORDER BY id DESC LIMIT ?1")
            .context("Failed to prepare run log query")?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                let level: String = row.get(1)?;
                Ok(LogEntry {
                    at: row.get(0)?,
                    level: Severity::from_label(&level).unwrap_or(Severity::Info),
                    message: row.get(2)?,
                })
            })
            .context("Failed to query run log")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read run log row")
    }
}
