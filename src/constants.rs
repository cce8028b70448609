//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To point the client at another Sentinel server, only edit this file
//! (or set the matching environment variable).

/// Default Sentinel API base URL
///
/// This is the fallback URL when no environment variable is set.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Default polling interval (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Default number of threat-score samples kept for the chart
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Default HTTP request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Shown while the status endpoint cannot be reached
pub const CONNECTION_LOST_MESSAGE: &str =
    "Connection to Sentinel lost. Is the Sentinel server running?";

/// Fallback when a rejected start carries no message
pub const START_FAILED_MESSAGE: &str = "Failed to start monitoring";

/// Fallback when a rejected stop carries no message
pub const STOP_FAILED_MESSAGE: &str = "Failed to stop monitoring";

/// Prefix the server uses when echoing the monitored folder
pub const START_CONFIRMATION_PREFIX: &str = "Monitoring started on ";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Sentinel Sync";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get Sentinel API URL from environment or use default
pub fn get_api_url() -> String {
    std::env::var("SENTINEL_API_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Get polling interval from environment or use default
pub fn get_poll_interval_ms() -> u64 {
    std::env::var("SENTINEL_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
}

/// Get history capacity from environment or use default
pub fn get_history_capacity() -> usize {
    std::env::var("SENTINEL_HISTORY_CAPACITY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_HISTORY_CAPACITY)
        .max(1)
}

/// Get request timeout from environment or use default
pub fn get_request_timeout_secs() -> u64 {
    std::env::var("SENTINEL_REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
}
