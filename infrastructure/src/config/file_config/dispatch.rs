//! Dispatch configuration from TOML (`[dispatch]` section)
//!
//! ```toml
//! [dispatch]
//! max_retries = 2
//! retry_delay_ms = 1000
//! default_timeout_seconds = 120
//! probe_timeout_seconds = 5
//! ```

use council_application::DispatchConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Timeout for nodes without their own `timeout_seconds`
    pub default_timeout_seconds: u64,
    pub probe_timeout_seconds: u64,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        let defaults = DispatchConfig::default();
        Self {
            max_retries: defaults.max_retries,
            retry_delay_ms: defaults.retry_delay.as_millis() as u64,
            default_timeout_seconds: defaults.default_timeout.as_secs(),
            probe_timeout_seconds: defaults.probe_timeout.as_secs(),
        }
    }
}

impl FileDispatchConfig {
    pub fn to_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::default()
            .with_max_retries(self.max_retries)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
            .with_default_timeout(Duration::from_secs(self.default_timeout_seconds))
            .with_probe_timeout(Duration::from_secs(self.probe_timeout_seconds))
    }
}
