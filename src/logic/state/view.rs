//! Read-only projections handed to presentation

use serde::Serialize;

use super::ErrorSource;
use crate::api::types::{LogEntry, QuarantinedFile};
use crate::logic::connection::ConnectionState;
use crate::logic::history::HistoryPoint;

/// Idle / Monitoring, independent of connectivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorPhase {
    Idle,
    Monitoring,
}

/// Owned copy of the synchronized state at one revision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentinelView {
    pub is_monitoring: bool,
    pub threat_score: f64,
    pub logs: Vec<LogEntry>,
    pub quarantined_files: Vec<QuarantinedFile>,
    pub alerts: Vec<LogEntry>,
    /// Empty while idle
    pub monitored_folder: String,
    pub history: Vec<HistoryPoint>,
    pub whitelist: Vec<String>,
    pub connection: ConnectionState,
    pub last_error: Option<String>,
    pub last_error_source: Option<ErrorSource>,
    /// Start/stop controls should be disabled while set
    pub command_in_flight: bool,
    pub revision: u64,
}

impl SentinelView {
    pub fn phase(&self) -> MonitorPhase {
        if self.is_monitoring {
            MonitorPhase::Monitoring
        } else {
            MonitorPhase::Idle
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn can_edit_whitelist(&self) -> bool {
        !self.is_monitoring && !self.command_in_flight
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary {
            phase: self.phase(),
            connection: self.connection,
            threat_score: self.threat_score,
            quarantined_count: self.quarantined_files.len(),
            log_count: self.logs.len(),
            alert_count: self.alerts.len(),
        }
    }
}

/// Headline numbers for a status card row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    pub phase: MonitorPhase,
    pub connection: ConnectionState,
    pub threat_score: f64,
    pub quarantined_count: usize,
    pub log_count: usize,
    pub alert_count: usize,
}

impl StatusSummary {
    pub fn status_text(&self) -> &'static str {
        match self.phase {
            MonitorPhase::Monitoring => "Active",
            MonitorPhase::Idle => "Offline",
        }
    }
}
