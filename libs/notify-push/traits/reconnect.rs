use std::time::Duration;

/// Default base interval between reconnection attempts
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// Trait for defining reconnection strategies
///
/// Implement this trait to control how long the client waits before
/// reopening the channel after a failure.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `error_count` - Consecutive failures since the last successful
    ///   authentication, including the one that just happened (1-based)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, error_count: u32) -> Option<Duration>;
}

/// Linear backoff reconnection strategy
///
/// The delay grows by one base interval per consecutive failure:
/// `error_count * base_interval`.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base_interval: Duration,
}

impl LinearBackoff {
    /// Create a new linear backoff strategy
    pub fn new(base_interval: Duration) -> Self {
        Self { base_interval }
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_INTERVAL)
    }
}

impl ReconnectionStrategy for LinearBackoff {
    fn next_delay(&self, error_count: u32) -> Option<Duration> {
        Some(self.base_interval.saturating_mul(error_count.max(1)))
    }
}

/// Never reconnect strategy
///
/// The client will not attempt to reconnect after a failure; only the
/// network-online edge or a new `listen` reopens the channel.
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _error_count: u32) -> Option<Duration> {
        None
    }
}
