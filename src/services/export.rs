use anyhow::Result;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::cache::JsonCache;
use crate::database::StateStore;

/// Writes the persisted state as JSON files for downstream renderers
pub struct ExportService<'a> {
    store: &'a dyn StateStore,
    out: JsonCache,
}

impl<'a> ExportService<'a> {
    pub fn new<P: AsRef<Path>>(store: &'a dyn StateStore, out_dir: P) -> Result<Self> {
        Ok(Self {
            store,
            out: JsonCache::create(out_dir)?,
        })
    }

    pub fn run(&self) -> Result<Vec<PathBuf>> {
        let state = self.store.load_state()?;
        let mut written = vec![
            self.out.save("raw_matches", &state.raw_matches)?,
            self.out.save("poll_states", &state.poll_states)?,
        ];

        match self.store.load_analysis()? {
            Some(analysis) => written.push(self.out.save("analysis", &analysis)?),
            None => warn!("No committed analysis yet, skipping analysis.json"),
        }

        info!("Exported {} files to {}", written.len(), self.out.dir().display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;
    use crate::config::settings::StoreSettings;
    use crate::database::{SqliteStateStore, StateCommit};
    use crate::scheduler::{PollPhase, PollState};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn store(name: &str) -> SqliteStateStore {
        let path = std::env::temp_dir().join(format!("match_poller_export_{}.db", name));
        let _ = std::fs::remove_file(&path);
        SqliteStateStore::open(&StoreSettings {
            database_path: path.to_string_lossy().to_string(),
            log_capacity: 10,
        })
        .unwrap()
    }

    #[test]
    fn test_export_without_analysis() {
        let store = store("empty");
        let out = std::env::temp_dir().join("match_poller_export_empty_out");
        let _ = std::fs::remove_dir_all(&out);

        let written = ExportService::new(&store, &out).unwrap().run().unwrap();

        assert_eq!(written.len(), 2);
        assert!(!out.join("analysis.json").exists());
        let _ = std::fs::remove_dir_all(&out);
    }

    #[test]
    fn test_export_writes_committed_state() {
        let store = store("committed");
        let mut poll_states = BTreeMap::new();
        poll_states.insert("lck".to_string(), PollState::new(5, PollPhase::Verifying));
        store
            .commit(&StateCommit {
                raw_matches: &BTreeMap::new(),
                poll_states: &poll_states,
                analysis: &AnalysisResult::default(),
                committed_at: Utc::now(),
            })
            .unwrap();
        let out = std::env::temp_dir().join("match_poller_export_committed_out");
        let _ = std::fs::remove_dir_all(&out);

        let written = ExportService::new(&store, &out).unwrap().run().unwrap();

        assert_eq!(written.len(), 3);
        let json = std::fs::read_to_string(out.join("poll_states.json")).unwrap();
        let parsed: BTreeMap<String, PollState> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, poll_states);
        let _ = std::fs::remove_dir_all(&out);
    }
}
