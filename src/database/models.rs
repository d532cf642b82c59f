use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::AnalysisResult;
use crate::domain::MatchRecord;
use crate::scheduler::PollState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }

    pub fn from_label(label: &str) -> Option<Severity> {
        match label {
            "info" => Some(Severity::Info),
            "success" => Some(Severity::Success),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: Severity,
    pub message: String,
}

/// Everything a run reads back from the previous one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub raw_matches: BTreeMap<String, Vec<MatchRecord>>,
    pub poll_states: BTreeMap<String, PollState>,
    /// Grand total of the last committed analysis; 0 before the first commit
    pub grand_total: u64,
}

/// State written atomically at the end of a successful run
pub struct StateCommit<'a> {
    pub raw_matches: &'a BTreeMap<String, Vec<MatchRecord>>,
    pub poll_states: &'a BTreeMap<String, PollState>,
    pub analysis: &'a AnalysisResult,
    pub committed_at: DateTime<Utc>,
}
