use chrono::{DateTime, Utc};

use crate::database::{LogEntry, Severity};

/// Operator-facing entries collected during one run.
///
/// Every entry is mirrored to the process log as it is recorded; the
/// coordinator hands the collected entries to the store when the run ends.
#[derive(Debug, Clone)]
pub struct RunLog {
    started_at: DateTime<Utc>,
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            entries: Vec::new(),
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(Severity::Info, message.into());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.record(Severity::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(Severity::Error, message.into());
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    fn record(&mut self, level: Severity, message: String) {
        match level {
            Severity::Error => log::error!("{}", message),
            Severity::Info | Severity::Success => log::info!("{}", message),
        }
        self.entries.push(LogEntry {
            at: self.started_at,
            level,
            message,
        });
    }
}
