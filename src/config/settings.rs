use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Re-poll interval while a tournament is ongoing or being verified
    pub fast_interval: Duration,
    /// Re-poll interval once a tournament is confirmed quiet
    pub slow_interval: Duration,
    /// Due tournaments are spread over this many runs
    pub rounds: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_secs(8 * 60),
            slow_interval: Duration::from_secs(60 * 60),
            rounds: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub page_limit: usize,
    /// Upper bound on pages per overview page; `None` pages until exhausted
    pub max_pages: Option<usize>,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_jitter: Duration,
    /// Politeness delay between pages of one query
    pub page_delay: Duration,
    /// Pacing delay between tournaments of one batch
    pub tournament_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            api_url: "https://lol.fandom.com/api.php".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/145.0.0.0 Safari/537.36".to_string(),
            timeout_secs: 30,
            page_limit: 50,
            max_pages: Some(100),
            max_attempts: 3,
            backoff_base: Duration::from_secs(30),
            backoff_jitter: Duration::from_secs(20),
            page_delay: Duration::from_millis(500),
            tournament_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    /// Time-slot hours per region; unlisted regions bucket by raw hour
    pub region_slots: BTreeMap<String, Vec<u32>>,
    /// Number of upcoming dates kept in the schedule
    pub schedule_days: usize,
    /// New totals below this share of the previous total are rolled back
    pub rollback_ratio: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        let mut region_slots = BTreeMap::new();
        region_slots.insert("LCK".to_string(), vec![16, 18]);
        region_slots.insert("LPL".to_string(), vec![15, 17, 19]);

        Self {
            region_slots,
            schedule_days: 4,
            rollback_ratio: 0.9,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub database_path: String,
    /// Run-log entries kept; oldest are dropped first
    pub log_capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_path: "match_poller.db".to_string(),
            log_capacity: 100,
        }
    }
}

/// Where `tournaments.json` and `teams.json` come from
#[derive(Debug, Clone)]
pub enum SourceSettings {
    Directory(PathBuf),
    Remote(String),
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings::Directory(PathBuf::from("config"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthSettings {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServerSettings {
    /// Bearer token required by `POST /api/force`; open when unset
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub scheduler: SchedulerSettings,
    pub fetch: FetchSettings,
    pub analysis: AnalysisSettings,
    pub store: StoreSettings,
    pub sources: SourceSettings,
    pub auth: AuthSettings,
    pub server: ServerSettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(path) = lookup("DATABASE_PATH") {
            config.store.database_path = path;
        }
        if let Some(url) = lookup("CONFIG_URL") {
            config.sources = SourceSettings::Remote(url);
        } else if let Some(dir) = lookup("CONFIG_DIR") {
            config.sources = SourceSettings::Directory(PathBuf::from(dir));
        }
        if let Some(url) = lookup("API_URL") {
            config.fetch.api_url = url;
        }
        if let Some(interval) = parse_minutes(&lookup, "FAST_INTERVAL_MINS") {
            config.scheduler.fast_interval = interval;
        }
        if let Some(interval) = parse_minutes(&lookup, "SLOW_INTERVAL_MINS") {
            config.scheduler.slow_interval = interval;
        }
        if let Some(rounds) = parse_var::<usize>(&lookup, "UPDATE_ROUNDS") {
            config.scheduler.rounds = rounds.max(1);
        }

        config.auth.username = lookup("WIKI_USER");
        config.auth.password = lookup("WIKI_PASS");
        config.server.admin_token = lookup("ADMIN_TOKEN").filter(|t| !t.is_empty());
        config
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring invalid {}={}", key, raw);
            None
        }
    }
}

fn parse_minutes(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let mins = parse_var::<u64>(lookup, key)?;
    match mins.checked_mul(60) {
        Some(secs) => Some(Duration::from_secs(secs)),
        None => {
            log::warn!("Ignoring out-of-range {}={}", key, mins);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.scheduler.rounds, 2);
        assert_eq!(config.scheduler.fast_interval, Duration::from_secs(480));
        assert!(matches!(config.sources, SourceSettings::Directory(_)));
        assert!(config.auth.credentials().is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_PATH", "/tmp/poller.db"),
            ("CONFIG_URL", "https://example.org/config"),
            ("UPDATE_ROUNDS", "3"),
            ("SLOW_INTERVAL_MINS", "90"),
            ("WIKI_USER", "bot"),
            ("WIKI_PASS", "secret"),
        ]));

        assert_eq!(config.store.database_path, "/tmp/poller.db");
        assert!(matches!(config.sources, SourceSettings::Remote(ref url) if url == "https://example.org/config"));
        assert_eq!(config.scheduler.rounds, 3);
        assert_eq!(config.scheduler.slow_interval, Duration::from_secs(90 * 60));
        assert_eq!(config.auth.credentials(), Some(("bot", "secret")));
    }

    #[test]
    fn test_invalid_numbers_keep_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("UPDATE_ROUNDS", "many")]));
        assert_eq!(config.scheduler.rounds, 2);
    }

    #[test]
    fn test_oversized_intervals_keep_defaults() {
        let huge = u64::MAX.to_string();
        let config = AppConfig::from_lookup(lookup_from(&[
            ("FAST_INTERVAL_MINS", huge.as_str()),
            ("SLOW_INTERVAL_MINS", huge.as_str()),
        ]));

        assert_eq!(config.scheduler.fast_interval, Duration::from_secs(480));
        assert_eq!(config.scheduler.slow_interval, Duration::from_secs(3600));
    }
}
