//! Manually driven network clock

use vguard_core::NetworkInstant;

/// Shared session clock that only moves when a test moves it
#[derive(Debug, Clone, Default)]
pub struct ManualNetworkClock {
    now_ms: i64,
}

impl ManualNetworkClock {
    /// Create a clock reading `start_ms`
    pub fn new(start_ms: i64) -> Self {
        Self { now_ms: start_ms }
    }

    /// Current instant
    pub fn now(&self) -> NetworkInstant {
        NetworkInstant::from_unix_ms(self.now_ms)
    }

    /// Advance the clock by `ms`. Returns the new reading, or `None` and
    /// leaves the clock untouched if the result is not a calendar instant.
    pub fn advance(&mut self, ms: i64) -> Option<NetworkInstant> {
        let next = self.now_ms.checked_add(ms)?;
        self.set(next)
    }

    /// Set the absolute time. Returns `None` and leaves the clock untouched
    /// if `now_ms` is not a calendar instant.
    pub fn set(&mut self, now_ms: i64) -> Option<NetworkInstant> {
        let instant = NetworkInstant::from_unix_ms(now_ms);
        instant.to_datetime()?;
        self.now_ms = now_ms;
        Some(instant)
    }
}
