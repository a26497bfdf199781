// Time Provider Port (for testability)

use chrono::{DateTime, FixedOffset, Local};

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Current wall-clock time in the operator's local timezone
    fn now(&self) -> DateTime<FixedOffset>;

    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

pub mod mocks {
    use super::*;

    /// Always returns the same instant
    pub struct FixedTimeProvider {
        at: DateTime<FixedOffset>,
    }

    impl FixedTimeProvider {
        pub fn new(at: DateTime<FixedOffset>) -> Self {
            Self { at }
        }

        /// Parse an RFC 3339 timestamp, e.g. `2024-05-01T14:05:00+00:00`
        pub fn at(rfc3339: &str) -> Self {
            Self::new(DateTime::parse_from_rfc3339(rfc3339).unwrap())
        }
    }

    impl TimeProvider for FixedTimeProvider {
        fn now(&self) -> DateTime<FixedOffset> {
            self.at
        }
    }
}
