use rand::Rng;
use std::time::Duration;

use crate::config::settings::FetchSettings;

/// Bounded attempts with randomized, doubling backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base: Duration, jitter: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base,
            jitter,
        }
    }

    pub fn from_settings(settings: &FetchSettings) -> Self {
        Self::new(settings.max_attempts, settings.backoff_base, settings.backoff_jitter)
    }

    /// Delay before the attempt following `failed_attempt` (1-based).
    /// A rate-limited response waits twice as long.
    pub fn backoff(&self, failed_attempt: u32, rate_limited: bool) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(6);
        let mut delay = self.base * 2u32.pow(exponent);
        if rate_limited {
            delay *= 2;
        }
        delay + self.random_jitter()
    }

    fn random_jitter(&self) -> Duration {
        let max_ms = self.jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}
