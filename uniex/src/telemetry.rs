use chrono::{DateTime, Utc};
use serde::Serialize;
use smol_str::SmolStr;
use std::fmt::Debug;

/// Version of the telemetry event contract consumed by downstream pipelines.
pub const CONTRACT_VERSION: u32 = 1;

/// The six events the core emits. Measurements and metadata follow the versioned
/// contract; the pipeline consuming them is an external collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    RequestStart {
        system_time: DateTime<Utc>,
        exchange: SmolStr,
        method: SmolStr,
        path: String,
    },
    RequestStop {
        duration_ms: u64,
        exchange: SmolStr,
        method: SmolStr,
        path: String,
        status: u16,
        rate_limit: Option<String>,
    },
    RequestException {
        duration_ms: u64,
        exchange: SmolStr,
        method: SmolStr,
        path: String,
        kind: SmolStr,
        reason: String,
    },
    CircuitBreakerOpen {
        system_time: DateTime<Utc>,
        exchange: SmolStr,
    },
    CircuitBreakerClosed {
        system_time: DateTime<Utc>,
        exchange: SmolStr,
    },
    CircuitBreakerRejected {
        system_time: DateTime<Utc>,
        exchange: SmolStr,
    },
}

/// Sink for [`TelemetryEvent`]s. The default sink drops them.
pub trait TelemetryHook: Send + Sync + Debug {
    fn emit(&self, event: TelemetryEvent);
}

#[derive(Debug, Default, Copy, Clone)]
pub struct NoopTelemetry;

impl TelemetryHook for NoopTelemetry {
    fn emit(&self, _event: TelemetryEvent) {}
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Test sink capturing every emitted event.
    #[derive(Debug, Default)]
    pub struct RecordingTelemetry {
        pub events: Mutex<Vec<TelemetryEvent>>,
    }

    impl TelemetryHook for RecordingTelemetry {
        fn emit(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(event);
        }
    }
}
