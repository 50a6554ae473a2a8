//! Timestamp source for the audit columns.

use chrono::Utc;
use chrono_tz::Tz;

/// `2020-01-31 14:05:09 EST`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Provides the value written to `Entry Created` / `Last Modified` columns.
pub trait Clock: Send + Sync {
    fn timestamp(&self) -> String;
}

/// Wall-clock time in a fixed named timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::US::Eastern)
    }
}

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.tz)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

/// Always returns the same timestamp.
#[derive(Debug, Clone)]
pub struct FixedClock(String);

impl FixedClock {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self(timestamp.into())
    }
}

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.0.clone()
    }
}
