//! Error handling
//!
//! Two layers:
//! - [`ApiError`] - what the HTTP transport can report
//! - [`SentinelError`] - what the engine surfaces to callers (connectivity,
//!   rejected commands, local validation)

use thiserror::Error;

use crate::constants;

pub type SentinelResult<T> = Result<T, SentinelError>;

/// Transport-level failures talking to the Sentinel service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Request never completed (refused, timed out, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx answer, with the server's `message` when the body carried one
    #[error("Server error: {status}")]
    Server { status: u16, message: Option<String> },

    /// 2xx answer whose body could not be understood
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Message supplied by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Local input problems, rejected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please specify a folder to monitor.")]
    EmptyPath,

    #[error("Whitelist path cannot be empty.")]
    EmptyWhitelistPath,

    #[error("Path is already whitelisted: {0}")]
    DuplicatePath(String),

    #[error("Stop monitoring to modify whitelist.")]
    MonitoringActive,

    #[error("Another command is still in progress.")]
    CommandInFlight,
}

/// Errors surfaced by the synchronization engine.
///
/// `Display` is the user-facing text written into the state's last error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SentinelError {
    /// Status poll could not complete
    #[error("{}", constants::CONNECTION_LOST_MESSAGE)]
    Connectivity(#[source] ApiError),

    /// Start/stop answered with a non-success status
    #[error("{message}")]
    CommandRejected { status: u16, message: String },

    /// Start/stop never got a usable answer
    #[error("{message}")]
    CommandFailed {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The session was torn down while the request was outstanding
    #[error("Session closed")]
    SessionClosed,

    #[error("Client setup failed: {0}")]
    Setup(String),
}

impl SentinelError {
    /// Build the error for a failed command, preferring the server's message
    pub(crate) fn from_command(err: ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Server { status, message } => Self::CommandRejected {
                status,
                message: message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            },
            other => Self::CommandFailed {
                message: fallback.to_string(),
                source: other,
            },
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
