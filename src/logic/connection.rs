//! Connection Tracker
//!
//! Reachability of the status endpoint, derived only from poll outcomes.
//! One failed poll flips to Disconnected, one successful poll flips back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

/// Tracks the state plus enough context to log edges sensibly
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    state: ConnectionState,
    consecutive_failures: u32,
    last_success: Option<DateTime<Utc>>,
}

impl ConnectionTracker {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    /// Record a successful poll. Returns the new state if it changed.
    pub fn record_success(&mut self) -> Option<ConnectionState> {
        self.consecutive_failures = 0;
        self.last_success = Some(Utc::now());
        self.transition(ConnectionState::Connected)
    }

    /// Record a failed poll. Returns the new state if it changed.
    pub fn record_failure(&mut self) -> Option<ConnectionState> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.transition(ConnectionState::Disconnected)
    }

    fn transition(&mut self, next: ConnectionState) -> Option<ConnectionState> {
        if self.state == next {
            return None;
        }
        self.state = next;
        Some(next)
    }
}
