use crate::config::RuntimeConfig;
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use uniex_spec::RateLimits;

#[derive(Debug)]
struct Window {
    timestamps: VecDeque<Instant>,
    last_cleanup: Instant,
}

/// Sliding-window request pacer: at most `max_requests` sends per `interval`, with old
/// timestamps swept on the configured cadence.
///
/// The facade acquires a permit *before* signing so timestamp-bearing signatures stay
/// fresh while a call is queued.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    interval: Duration,
    max_age: Duration,
    cleanup_interval: Duration,
    window: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, interval: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1) as usize,
            interval,
            max_age: interval.max(Duration::from_millis(60_000)),
            cleanup_interval: Duration::from_millis(60_000),
            window: Mutex::new(Window {
                timestamps: VecDeque::new(),
                last_cleanup: Instant::now(),
            }),
        }
    }

    /// Build from the spec-advertised pacing and the runtime sweep knobs.
    pub fn from_config(config: &RuntimeConfig, rate_limits: Option<&RateLimits>) -> Self {
        let max_requests = rate_limits.and_then(|limits| limits.max_requests).unwrap_or(10);
        let interval_ms = rate_limits
            .and_then(|limits| limits.interval_ms)
            .unwrap_or(1_000);

        let mut limiter = Self::new(max_requests, Duration::from_millis(interval_ms.max(1)));
        limiter.max_age = Duration::from_millis(config.rate_limit_max_age_ms.max(interval_ms));
        limiter.cleanup_interval = Duration::from_millis(config.rate_limit_cleanup_interval_ms);
        limiter
    }

    /// Wait until a request slot is free, then claim it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                self.sweep(&mut window, now);

                while window
                    .timestamps
                    .front()
                    .is_some_and(|first| now.duration_since(*first) >= self.interval)
                {
                    window.timestamps.pop_front();
                }

                if window.timestamps.len() < self.max_requests {
                    window.timestamps.push_back(now);
                    return;
                }

                // Slot frees when the oldest in-window timestamp ages out.
                window
                    .timestamps
                    .front()
                    .map(|first| self.interval.saturating_sub(now.duration_since(*first)))
                    .unwrap_or(self.interval)
            };
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    fn sweep(&self, window: &mut Window, now: Instant) {
        if now.duration_since(window.last_cleanup) >= self.cleanup_interval {
            let max_age = self.max_age;
            window
                .timestamps
                .retain(|timestamp| now.duration_since(*timestamp) <= max_age);
            window.last_cleanup = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant as TokioInstant;

    #[tokio::test]
    async fn test_burst_within_capacity_is_immediate() {
        let limiter = RateLimiter::new(3, Duration::from_millis(200));
        let start = TokioInstant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_excess_request_waits_for_window() {
        let limiter = RateLimiter::new(2, Duration::from_millis(100));
        limiter.acquire().await;
        limiter.acquire().await;

        let start = TokioInstant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_from_config_uses_spec_pacing() {
        let limits = RateLimits {
            max_requests: Some(1),
            interval_ms: Some(50),
        };
        let limiter = RateLimiter::from_config(&RuntimeConfig::default(), Some(&limits));
        limiter.acquire().await;
        let start = TokioInstant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
