use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Enforces a minimum spacing between consecutive upstream requests.
///
/// The first request goes out immediately; later ones wait out whatever is
/// left of `delay` since the previous call.
pub struct RateLimiter {
    delay: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: None,
        }
    }

    pub async fn wait(&mut self) {
        if let Some(ready_at) = self.ready_at() {
            sleep_until(ready_at).await;
        }
        self.last_request = Some(Instant::now());
    }

    fn ready_at(&self) -> Option<Instant> {
        self.last_request
            .map(|last| last + self.delay)
            .filter(|ready_at| *ready_at > Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_wait_is_immediate() {
        let mut limiter = RateLimiter::new(Duration::from_secs(60));
        let started = Instant::now();
        limiter.wait().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_second_wait_respects_spacing() {
        let mut limiter = RateLimiter::new(Duration::from_millis(30));
        limiter.wait().await;

        let started = Instant::now();
        limiter.wait().await;
        assert!(started.elapsed() >= Duration::from_millis(25));
    }
}
