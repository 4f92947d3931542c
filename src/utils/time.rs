use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(test)]
use mockall::automock;

/// Source of wall-clock time for age-based retention.
///
/// Injected into the deletion policy so tests can pin "now".
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Reads the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_millis(&self) -> u64 {
        timestamp_millis()
    }
}

/// return milliseconds since epoch; 0 if the system clock is before the epoch
pub fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
