//! Synchronized State Store
//!
//! The single mutable record shared by the poller and the command
//! coordinator. Presentation gets a [`StateHandle`] and can only read or
//! subscribe; mutation methods are crate-private.
//!
//! Ownership domains:
//! - server-owned: monitoring flag, score, logs, quarantine, alerts
//! - client-owned: whitelist (until a start transmits it), history
//!
//! Every mutation happens under one write lock and bumps the revision
//! published on a `watch` channel. Once closed, the store ignores writes.

mod view;


pub use view::{MonitorPhase, SentinelView, StatusSummary};

use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;

use crate::api::types::{LogEntry, QuarantinedFile, Snapshot};
use crate::error::{ApiError, SentinelError, ValidationError};
use crate::logic::connection::{ConnectionState, ConnectionTracker};
use crate::logic::history::{HistoryBuffer, HistoryPoint};
use crate::logic::whitelist::WhitelistSet;

// ============================================================================
// ERROR SURFACE
// ============================================================================

/// Which stream produced the error currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorSource {
    Connectivity,
    Command,
    Validation,
}

#[derive(Debug, Clone, PartialEq)]
struct SurfacedError {
    source: ErrorSource,
    message: String,
}

impl SurfacedError {
    fn from_error(err: &SentinelError) -> Option<Self> {
        let source = match err {
            SentinelError::Connectivity(_) => ErrorSource::Connectivity,
            SentinelError::CommandRejected { .. } | SentinelError::CommandFailed { .. } => ErrorSource::Command,
            SentinelError::Validation(_) => ErrorSource::Validation,
            SentinelError::SessionClosed | SentinelError::Setup(_) => return None,
        };
        Some(Self { source, message: err.to_string() })
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug)]
struct SyncState {
    is_monitoring: bool,
    threat_score: f64,
    logs: Vec<LogEntry>,
    quarantined_files: Vec<QuarantinedFile>,
    alerts: Vec<LogEntry>,
    monitored_folder: String,
    history: HistoryBuffer,
    whitelist: WhitelistSet,
    connection: ConnectionTracker,
    last_error: Option<SurfacedError>,
    /// Bumped when a command begins and when it ends
    command_epoch: u64,
    command_in_flight: bool,
    closed: bool,
}

impl SyncState {
    fn new(history_capacity: usize) -> Self {
        Self {
            is_monitoring: false,
            threat_score: 0.0,
            logs: Vec::new(),
            quarantined_files: Vec::new(),
            alerts: Vec::new(),
            monitored_folder: String::new(),
            history: HistoryBuffer::new(history_capacity),
            whitelist: WhitelistSet::new(),
            connection: ConnectionTracker::default(),
            last_error: None,
            command_epoch: 0,
            command_in_flight: false,
            closed: false,
        }
    }

    /// Replace every server-owned field with the snapshot's
    fn apply_snapshot(&mut self, snapshot: Snapshot, now: DateTime<Local>) {
        let was_monitoring = self.is_monitoring;

        self.is_monitoring = snapshot.is_monitoring;
        self.threat_score = snapshot.threat_score;
        self.logs = snapshot.logs;
        self.quarantined_files = snapshot.quarantined_files;
        self.alerts = snapshot.alerts;

        if snapshot.is_monitoring {
            self.history.push(HistoryPoint::at(now, snapshot.threat_score));
            // Edits are locked while monitoring, nothing local to lose
            self.whitelist.replace_with(&snapshot.whitelist);
        } else {
            if was_monitoring {
                log::info!("Sentinel reports monitoring stopped");
            }
            self.history.clear();
            self.monitored_folder.clear();
        }
    }

    fn check_whitelist_editable(&self) -> Result<(), ValidationError> {
        if self.is_monitoring {
            return Err(ValidationError::MonitoringActive);
        }
        if self.command_in_flight {
            return Err(ValidationError::CommandInFlight);
        }
        Ok(())
    }

    fn set_error(&mut self, err: &SentinelError) {
        if let Some(surfaced) = SurfacedError::from_error(err) {
            self.last_error = Some(surfaced);
        }
    }

    fn end_command(&mut self) {
        self.command_in_flight = false;
        self.command_epoch += 1;
    }

    fn view(&self, revision: u64) -> SentinelView {
        SentinelView {
            is_monitoring: self.is_monitoring,
            threat_score: self.threat_score,
            logs: self.logs.clone(),
            quarantined_files: self.quarantined_files.clone(),
            alerts: self.alerts.clone(),
            monitored_folder: self.monitored_folder.clone(),
            history: self.history.to_vec(),
            whitelist: self.whitelist.to_vec(),
            connection: self.connection.state(),
            last_error: self.last_error.as_ref().map(|e| e.message.clone()),
            last_error_source: self.last_error.as_ref().map(|e| e.source),
            command_in_flight: self.command_in_flight,
            revision,
        }
    }
}

// ============================================================================
// RECONCILIATION TYPES
// ============================================================================

/// Taken when a poll request is issued, checked when its outcome is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PollTicket {
    epoch: u64,
    during_command: bool,
}

/// What happened to a poll outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollApplied {
    /// Snapshot written into the store
    Fresh,
    /// A command overlapped the request; snapshot fields left alone
    Stale,
    /// Poll failed; connection marked down
    Failed,
    /// Store already closed
    Ignored,
}

// ============================================================================
// HANDLE
// ============================================================================

struct StoreInner {
    state: RwLock<SyncState>,
    revision: watch::Sender<u64>,
}

/// Shared handle to the synchronized state
#[derive(Clone)]
pub struct StateHandle {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateHandle")
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

impl StateHandle {
    pub(crate) fn new(history_capacity: usize) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(SyncState::new(history_capacity)),
                revision,
            }),
        }
    }

    // ---- read side -------------------------------------------------------

    /// Owned copy of the whole state
    pub fn view(&self) -> SentinelView {
        let revision = self.revision();
        self.inner.state.read().view(revision)
    }

    /// Receiver that changes on every mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner.state.read().is_monitoring
    }

    pub fn connection(&self) -> ConnectionState {
        self.inner.state.read().connection.state()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.state.read().last_error.as_ref().map(|e| e.message.clone())
    }

    pub fn whitelist(&self) -> Vec<String> {
        self.inner.state.read().whitelist.to_vec()
    }

    pub fn history(&self) -> Vec<HistoryPoint> {
        self.inner.state.read().history.to_vec()
    }

    pub fn command_in_flight(&self) -> bool {
        self.inner.state.read().command_in_flight
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.read().closed
    }

    // ---- write side ------------------------------------------------------

    /// Run `f` under the write lock unless closed, then publish a revision
    fn mutate<R>(&self, f: impl FnOnce(&mut SyncState) -> R) -> Option<R> {
        let result = {
            let mut state = self.inner.state.write();
            if state.closed {
                return None;
            }
            f(&mut *state)
        };
        self.inner.revision.send_modify(|rev| *rev += 1);
        Some(result)
    }

    pub(crate) fn begin_poll(&self) -> PollTicket {
        let state = self.inner.state.read();
        PollTicket {
            epoch: state.command_epoch,
            during_command: state.command_in_flight,
        }
    }

    /// Fold a poll outcome into the store.
    ///
    /// Connectivity always follows the outcome. Snapshot fields are only
    /// written if no command began or ended since the ticket was taken.
    pub(crate) fn apply_poll(
        &self,
        ticket: PollTicket,
        outcome: Result<Snapshot, ApiError>,
        now: DateTime<Local>,
    ) -> PollApplied {
        self.mutate(move |state| {
            let stale = ticket.during_command
                || state.command_in_flight
                || ticket.epoch != state.command_epoch;

            match outcome {
                Ok(snapshot) => {
                    if state.connection.record_success().is_some() {
                        log::info!("Connected to Sentinel");
                    }
                    if matches!(&state.last_error, Some(e) if e.source == ErrorSource::Connectivity) {
                        state.last_error = None;
                    }
                    if stale {
                        log::debug!("Discarding status snapshot that overlapped a command");
                        return PollApplied::Stale;
                    }
                    state.apply_snapshot(snapshot, now);
                    PollApplied::Fresh
                }
                Err(err) => {
                    if state.connection.record_failure().is_some() {
                        log::warn!("Lost connection to Sentinel: {}", err);
                    } else {
                        log::debug!(
                            "Status poll failed ({} in a row): {}",
                            state.connection.consecutive_failures(),
                            err
                        );
                    }
                    let keep_command_error = stale
                        && matches!(&state.last_error, Some(e) if e.source != ErrorSource::Connectivity);
                    if !keep_command_error {
                        state.set_error(&SentinelError::Connectivity(err));
                    }
                    PollApplied::Failed
                }
            }
        })
        .unwrap_or(PollApplied::Ignored)
    }

    /// Claim the single command slot
    pub(crate) fn begin_command(&self) -> Result<CommandGuard, SentinelError> {
        let claimed = self.mutate(|state| {
            if state.command_in_flight {
                let err = SentinelError::Validation(ValidationError::CommandInFlight);
                state.set_error(&err);
                return Err(err);
            }
            state.command_in_flight = true;
            state.command_epoch += 1;
            state.last_error = None;
            Ok(state.whitelist.to_vec())
        });

        match claimed {
            Some(Ok(whitelist)) => Ok(CommandGuard {
                state: self.clone(),
                whitelist,
                finished: false,
            }),
            Some(Err(err)) => Err(err),
            None => Err(SentinelError::SessionClosed),
        }
    }

    /// Surface an error produced outside a command (e.g. input validation)
    pub(crate) fn record_error(&self, err: &SentinelError) {
        self.mutate(|state| state.set_error(err));
    }

    pub(crate) fn add_whitelist(&self, path: &str) -> Result<(), SentinelError> {
        self.edit_whitelist(|whitelist| whitelist.add(path).map(|_| true))
            .map(|_| ())
    }

    pub(crate) fn remove_whitelist(&self, path: &str) -> Result<bool, SentinelError> {
        self.edit_whitelist(|whitelist| Ok(whitelist.remove(path)))
    }

    fn edit_whitelist(
        &self,
        edit: impl FnOnce(&mut WhitelistSet) -> Result<bool, ValidationError>,
    ) -> Result<bool, SentinelError> {
        self.mutate(|state| {
            let result = state
                .check_whitelist_editable()
                .and_then(|_| edit(&mut state.whitelist));
            result.map_err(|v| {
                let err = SentinelError::Validation(v);
                state.set_error(&err);
                err
            })
        })
        .unwrap_or(Err(SentinelError::SessionClosed))
    }

    /// Stop accepting writes. Idempotent.
    pub(crate) fn close(&self) {
        let newly_closed = {
            let mut state = self.inner.state.write();
            !std::mem::replace(&mut state.closed, true)
        };
        if newly_closed {
            self.inner.revision.send_modify(|rev| *rev += 1);
        }
    }
}

// ============================================================================
// COMMAND GUARD
// ============================================================================

/// Holds the command slot; releasing it (by finishing or dropping) makes
/// every poll issued in the meantime stale.
#[must_use]
pub(crate) struct CommandGuard {
    state: StateHandle,
    whitelist: Vec<String>,
    finished: bool,
}

impl CommandGuard {
    /// Whitelist as it was when the command began
    pub(crate) fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    /// Monitoring confirmed on `folder`; history restarts at zero
    pub(crate) fn finish_start(mut self, folder: String, now: DateTime<Local>) -> bool {
        self.finished = true;
        self.state
            .mutate(move |state| {
                state.is_monitoring = true;
                state.monitored_folder = folder;
                state.history.reset_to(HistoryPoint::at(now, 0.0));
                state.end_command();
            })
            .is_some()
    }

    /// Monitoring stopped; server-owned fields reset
    pub(crate) fn finish_stop(mut self) -> bool {
        self.finished = true;
        self.state
            .mutate(|state| {
                state.is_monitoring = false;
                state.threat_score = 0.0;
                state.logs.clear();
                state.quarantined_files.clear();
                state.alerts.clear();
                state.monitored_folder.clear();
                state.history.clear();
                state.end_command();
            })
            .is_some()
    }

    /// Command failed; only the error changes
    pub(crate) fn fail(mut self, err: &SentinelError) {
        self.finished = true;
        self.state.mutate(|state| {
            state.set_error(err);
            state.end_command();
        });
    }
}

impl Drop for CommandGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.state.mutate(|state| state.end_command());
        }
    }
}
