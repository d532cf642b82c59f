use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

use super::settings::{AppConfig, SourceSettings};
use crate::cache::JsonCache;
use crate::domain::{RuntimeConfig, TeamMap, TournamentSource};
use crate::errors::ConfigError;

const TOURNAMENTS_KEY: &str = "tournaments";
const TEAMS_KEY: &str = "teams";

/// Supplies the tournament roster and team alias map for a run
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn load(&self) -> Result<RuntimeConfig, ConfigError>;
}

pub fn build_config_source(config: &AppConfig) -> anyhow::Result<Box<dyn ConfigSource>> {
    Ok(match &config.sources {
        SourceSettings::Directory(dir) => Box::new(DirectoryConfigSource::new(dir)),
        SourceSettings::Remote(base_url) => {
            Box::new(RemoteConfigSource::new(base_url, config.fetch.timeout_secs)?)
        }
    })
}

/// Reads `tournaments.json` and `teams.json` from a local directory
pub struct DirectoryConfigSource {
    files: JsonCache,
}

impl DirectoryConfigSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            files: JsonCache::open(dir),
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.files
            .load(key)
            .map_err(|e| ConfigError::Unreadable {
                name: key.to_string(),
                reason: format!("{:#}", e),
            })?
            .ok_or_else(|| ConfigError::Missing(format!("{}/{}.json", self.files.dir().display(), key)))
    }
}

#[async_trait]
impl ConfigSource for DirectoryConfigSource {
    async fn load(&self) -> Result<RuntimeConfig, ConfigError> {
        let tournaments: Vec<TournamentSource> = self.read(TOURNAMENTS_KEY)?;
        let team_map: TeamMap = self.read(TEAMS_KEY)?;
        validate(RuntimeConfig {
            tournaments,
            team_map,
        })
    }
}

/// Fetches the same two documents from `<base_url>/<name>.json`
pub struct RemoteConfigSource {
    client: Client,
    base_url: String,
}

impl RemoteConfigSource {
    pub fn new(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let url = format!("{}/{}.json", self.base_url, key);
        debug!("Loading configuration from {}", url);

        let unreadable = |reason: String| ConfigError::Unreadable {
            name: key.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unreadable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ConfigError::Missing(url));
        }
        if !response.status().is_success() {
            return Err(unreadable(format!("HTTP {}", response.status())));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| unreadable(e.to_string()))
    }
}

#[async_trait]
impl ConfigSource for RemoteConfigSource {
    async fn load(&self) -> Result<RuntimeConfig, ConfigError> {
        let tournaments: Vec<TournamentSource> = self.fetch(TOURNAMENTS_KEY).await?;
        let team_map: TeamMap = self.fetch(TEAMS_KEY).await?;
        validate(RuntimeConfig {
            tournaments,
            team_map,
        })
    }
}

fn validate(config: RuntimeConfig) -> Result<RuntimeConfig, ConfigError> {
    if config.tournaments.is_empty() {
        return Err(ConfigError::NoTournaments);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("match_poller_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_directory_source_loads_both_files() {
        let dir = temp_dir("config_ok");
        fs::write(
            dir.join("tournaments.json"),
            r#"[{"slug": "lck", "title": "LCK", "region": "LCK", "overview_pages": ["LCK/2026"]}]"#,
        )
        .unwrap();
        fs::write(dir.join("teams.json"), r#"{"Gen.G": "GEN"}"#).unwrap();

        let config = DirectoryConfigSource::new(&dir).load().await.unwrap();
        assert_eq!(config.tournaments.len(), 1);
        assert_eq!(config.team_map.get("Gen.G").map(String::as_str), Some("GEN"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_directory_source_requires_team_map() {
        let dir = temp_dir("config_missing");
        fs::write(
            dir.join("tournaments.json"),
            r#"[{"slug": "lck", "region": "LCK", "overview_pages": ["LCK/2026"]}]"#,
        )
        .unwrap();

        let err = DirectoryConfigSource::new(&dir).load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_empty_roster_is_rejected() {
        let dir = temp_dir("config_empty");
        fs::write(dir.join("tournaments.json"), "[]").unwrap();
        fs::write(dir.join("teams.json"), "{}").unwrap();

        let err = DirectoryConfigSource::new(&dir).load().await.unwrap_err();
        assert!(matches!(err, ConfigError::NoTournaments));

        fs::remove_dir_all(&dir).unwrap();
    }
}
