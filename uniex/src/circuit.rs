use crate::config::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    fmt::{Display, Formatter},
    sync::Mutex,
    time::{Duration, Instant},
};

/// Observable breaker state, as reported by health checks.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl Display for CircuitState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        write!(f, "{state}")
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failures: VecDeque<Instant>,
    opened_at: Option<Instant>,
}

/// Per-exchange circuit breaker: `max_failures` within `window_ms` opens the circuit,
/// which rejects calls without a network round trip until `reset_ms` elapses, then
/// allows a single probe.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: VecDeque::new(),
                opened_at: None,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Whether a call may proceed. An open circuit transitions to half-open once the
    /// reset window has elapsed, admitting one probe.
    pub fn try_acquire(&self) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => false,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|opened_at| opened_at.elapsed())
                    .unwrap_or_default();
                if elapsed >= Duration::from_millis(self.config.reset_ms) {
                    inner.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        if !self.config.enabled {
            return;
        }
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.failures.clear();
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        if !self.config.enabled {
            return;
        }
        let mut inner = self.lock();
        let now = Instant::now();
        let window = Duration::from_millis(self.config.window_ms);

        inner.failures.push_back(now);
        while inner
            .failures
            .front()
            .is_some_and(|first| now.duration_since(*first) > window)
        {
            inner.failures.pop_front();
        }

        let tripped = inner.state == CircuitState::HalfOpen
            || inner.failures.len() as u32 >= self.config.max_failures;
        if tripped {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(now);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        // Breaker state is tiny and never held across await points.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_failures: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            enabled: true,
            max_failures,
            window_ms: 60_000,
            reset_ms: 0,
        }
    }

    #[test]
    fn test_opens_after_max_failures() {
        let breaker = CircuitBreaker::new(config(3));
        assert!(breaker.try_acquire());

        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_open_circuit_admits_probe_after_reset() {
        let breaker = CircuitBreaker::new(config(1));
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        // reset_ms is zero, so the next acquire is the half-open probe.
        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(!breaker.try_acquire());

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire());
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let breaker = CircuitBreaker::new(config(1));
        breaker.record_failure();
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_disabled_breaker_never_blocks() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            enabled: false,
            ..CircuitBreakerConfig::default()
        });
        for _ in 0..100 {
            breaker.record_failure();
        }
        assert!(breaker.try_acquire());
    }
}
