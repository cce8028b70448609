//! Configuration module

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Sentinel service base URL
    pub api_url: String,

    /// Delay between status polls
    pub poll_interval_ms: u64,

    /// Threat-score samples kept for the chart
    pub history_capacity: usize,

    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            history_capacity: constants::DEFAULT_HISTORY_CAPACITY,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl SentinelConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_url: constants::get_api_url(),
            poll_interval_ms: constants::get_poll_interval_ms(),
            history_capacity: constants::get_history_capacity(),
            request_timeout_secs: constants::get_request_timeout_secs(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
