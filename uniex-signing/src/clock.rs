use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Debug;

/// Injectable time source so that timestamp-bearing signatures are deterministic in
/// tests.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock reading the system time.
#[derive(Debug, Copy, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for deterministic signing tests.
#[derive(Debug, Copy, Clone)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Construct from a unix epoch timestamp in milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Self(DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Timestamp encodings used across signing patterns.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// Unix epoch milliseconds.
    Ms,
    /// Unix epoch seconds.
    Seconds,
    /// ISO-8601 with millisecond precision and a `Z` suffix.
    Iso8601,
}

impl Default for TimestampFormat {
    fn default() -> Self {
        Self::Ms
    }
}

impl TimestampFormat {
    /// Render the current clock reading in this encoding.
    pub fn render(&self, clock: &dyn Clock) -> String {
        let now = clock.now();
        match self {
            TimestampFormat::Ms => now.timestamp_millis().to_string(),
            TimestampFormat::Seconds => now.timestamp().to_string(),
            TimestampFormat::Iso8601 => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
