//! Wire Types
//!
//! Request/response shapes of the Sentinel HTTP service.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

/// Severity of a server log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Critical,
}

/// One server log line. Owned by the server; never edited client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Server-formatted, shown as-is
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

/// A file the service moved into quarantine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantinedFile {
    pub name: String,
    pub timestamp: String,
}

/// `GET /status` payload - one complete, atomic status report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub is_monitoring: bool,
    pub threat_score: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub logs: Vec<LogEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub quarantined_files: Vec<QuarantinedFile>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub whitelist: Vec<String>,
    /// Recent CRITICAL entries; older servers omit it
    #[serde(default, deserialize_with = "null_as_empty")]
    pub alerts: Vec<LogEntry>,
}

impl Snapshot {
    /// Reject payloads that parse but break the data model
    pub fn validate(self) -> Result<Self, ApiError> {
        if !self.threat_score.is_finite() || self.threat_score < 0.0 {
            return Err(ApiError::Parse(format!(
                "threatScore out of range: {}",
                self.threat_score
            )));
        }
        Ok(self)
    }
}

/// `POST /start` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub path: String,
    pub whitelist: Vec<String>,
}

/// `{ message }` body returned by the command endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageResponse {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()) }
    }
}

/// Treat an explicit `null` list the same as a missing one
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
