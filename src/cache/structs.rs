use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory of JSON documents addressed by key (`<dir>/<key>.json`).
///
/// Backs the directory configuration source and the export of run output.
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    /// Open an existing directory without touching the filesystem
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Open a directory for writing, creating it when missing
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<PathBuf> {
        let file_path = self.build_path(key);
        let json = serde_json::to_string_pretty(data).context("Failed to serialize data")?;
        fs::write(&file_path, json)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;

        info!("Saved {}", file_path.display());
        Ok(file_path)
    }

    pub fn load<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        let file_path = self.build_path(key);
        if !file_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        let data = serde_json::from_str(&json).with_context(|| {
            format!(
                "Failed to parse JSON from {}. First 200 chars: {}",
                file_path.display(),
                json.chars().take(200).collect::<String>()
            )
        })?;

        debug!("Loaded {}", file_path.display());
        Ok(Some(data))
    }

    fn build_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        value: String,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = std::env::temp_dir().join(format!("match_poller_cache_{}", std::process::id()));
        let cache = JsonCache::create(&temp_dir).unwrap();

        let data = TestData {
            value: "test".to_string(),
        };

        cache.save("test_key", &data).unwrap();
        let loaded: Option<TestData> = cache.load("test_key").unwrap();
        assert_eq!(loaded, Some(data));

        let missing: Option<TestData> = cache.load("missing").unwrap();
        assert_eq!(missing, None);

        fs::remove_dir_all(&temp_dir).unwrap();
    }

    #[test]
    fn test_load_reports_invalid_json() {
        let temp_dir = std::env::temp_dir().join(format!("match_poller_cache_bad_{}", std::process::id()));
        let cache = JsonCache::create(&temp_dir).unwrap();
        fs::write(temp_dir.join("broken.json"), "{not json").unwrap();

        let result: Result<Option<TestData>> = cache.load("broken");
        assert!(result.is_err());

        fs::remove_dir_all(&temp_dir).unwrap();
    }
}
