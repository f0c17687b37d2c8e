//! Dispatch parameters: retries and timeouts for node requests.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and timeout policy applied by the query dispatcher.
///
/// A request makes at most `max_retries + 1` attempts with `retry_delay`
/// between them. `default_timeout` applies when neither the request nor the
/// routed node sets one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub default_timeout: Duration,
    /// Bound on a single health probe
    pub probe_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
            default_timeout: Duration::from_secs(120),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl DispatchConfig {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Total number of attempts per request
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.attempts(), 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert_eq!(config.default_timeout, Duration::from_secs(120));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_builder() {
        let config = DispatchConfig::default()
            .with_max_retries(0)
            .with_retry_delay(Duration::ZERO);
        assert_eq!(config.attempts(), 1);
        assert_eq!(config.retry_delay, Duration::ZERO);
    }
}
