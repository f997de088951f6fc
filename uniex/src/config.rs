use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Retry strategy applied to transient transport failures.
///
/// The on-disk form accepts `"safe_transient"`, `"transient"` or literal `false`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Retry only idempotent methods on transient failures. The default.
    SafeTransient,
    /// Retry every method on transient failures.
    Transient,
    /// Never retry.
    Never,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::SafeTransient
    }
}

impl<'de> Deserialize<'de> for RetryPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(false) => Ok(RetryPolicy::Never),
            Repr::Flag(true) => Ok(RetryPolicy::SafeTransient),
            Repr::Name(name) => match name.as_str() {
                "safe_transient" => Ok(RetryPolicy::SafeTransient),
                "transient" => Ok(RetryPolicy::Transient),
                "never" => Ok(RetryPolicy::Never),
                other => Err(serde::de::Error::custom(format!(
                    "unknown retry policy: {other}"
                ))),
            },
        }
    }
}

/// Circuit breaker tuning knobs.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,
    /// Consecutive-window failure count that opens the circuit.
    pub max_failures: u32,
    /// Sliding window over which failures are counted.
    pub window_ms: u64,
    /// How long an open circuit waits before allowing a probe request.
    pub reset_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failures: 5,
            window_ms: 60_000,
            reset_ms: 30_000,
        }
    }
}

/// Process-scoped runtime defaults, threaded explicitly through client construction.
///
/// Defaults are hard-coded here; overrides flow at handle construction, never through
/// ambient global state.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Request timestamp validity window.
    pub recv_window_ms: u64,
    /// HTTP request timeout.
    pub request_timeout_ms: u64,
    /// How often old rate-limit timestamps are swept.
    pub rate_limit_cleanup_interval_ms: u64,
    /// Age beyond which rate-limit timestamps are discarded.
    pub rate_limit_max_age_ms: u64,
    pub retry_policy: RetryPolicy,
    /// Log exceptions with full traces; may leak sensitive data.
    pub debug: bool,
    /// Opaque identifier appended to order-placing requests where applicable.
    pub broker_id: Option<String>,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            recv_window_ms: 5_000,
            request_timeout_ms: 10_000,
            rate_limit_cleanup_interval_ms: 60_000,
            rate_limit_max_age_ms: 60_000,
            retry_policy: RetryPolicy::default(),
            debug: false,
            broker_id: None,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Open per-call configuration.
///
/// Recognised keys are typed fields; anything else goes in `forward` and is handed to
/// the HTTP collaborator verbatim.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallOptions {
    /// Extra request params merged over the positional arguments.
    pub params: Map<String, Value>,
    /// Skip typed coercion and return the raw response map.
    pub raw: bool,
    /// Per-call retry policy override.
    pub retry: Option<RetryPolicy>,
    /// Per-call timeout override.
    pub timeout_ms: Option<u64>,
    /// Resolve the sandbox API url instead of production.
    pub sandbox: bool,
    /// Unrecognised option keys, forwarded to the transport untouched.
    pub forward: Map<String, Value>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    pub fn sandbox(mut self) -> Self {
        self.sandbox = true;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_accepts_false() {
        assert_eq!(
            serde_json::from_str::<RetryPolicy>("false").unwrap(),
            RetryPolicy::Never
        );
        assert_eq!(
            serde_json::from_str::<RetryPolicy>(r#""transient""#).unwrap(),
            RetryPolicy::Transient
        );
    }

    #[test]
    fn test_runtime_config_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.recv_window_ms, 5_000);
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.retry_policy, RetryPolicy::SafeTransient);
        assert!(config.circuit_breaker.enabled);
    }

    #[test]
    fn test_runtime_config_partial_overrides() {
        let config =
            serde_json::from_str::<RuntimeConfig>(r#"{"retry_policy": false, "debug": true}"#)
                .unwrap();
        assert_eq!(config.retry_policy, RetryPolicy::Never);
        assert!(config.debug);
        assert_eq!(config.request_timeout_ms, 10_000);
    }
}
