//! Snapshot Poller - background status polling
//!
//! Flow:
//! 1. First `/status` request is issued immediately on start
//! 2. Next request waits for the interval AND for the previous outcome
//!    (polls never overlap)
//! 3. Each outcome is folded into the store through a [`PollTicket`]
//!
//! Stopping cancels the timer and drops any in-flight request; nothing it
//! returns reaches the store afterwards.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::SentinelApi;
use crate::logic::state::{PollApplied, StateHandle};

/// Running poll task
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Cancel without waiting
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait until the task has exited
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    log::error!("Status poller panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Owns at most one polling task for a store
pub struct Poller<A: SentinelApi> {
    api: Arc<A>,
    state: StateHandle,
    interval: Duration,
    /// Child tokens are derived from this so session teardown reaches them
    session: CancellationToken,
    running: Mutex<Option<PollerHandle>>,
}

impl<A: SentinelApi> Poller<A> {
    pub fn new(api: Arc<A>, state: StateHandle, interval: Duration, session: CancellationToken) -> Self {
        Self {
            api,
            state,
            interval,
            session,
            running: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Start polling. Returns false if a poll task is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|handle| !handle.is_finished()) {
            log::debug!("Status poller already running");
            return false;
        }
        if self.session.is_cancelled() {
            log::debug!("Session closed, not starting status poller");
            return false;
        }

        let cancel = self.session.child_token();
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.api),
            self.state.clone(),
            self.interval,
            cancel.clone(),
        ));

        log::info!("Status poller started (every {}ms)", self.interval.as_millis());
        *running = Some(PollerHandle { cancel, task: Some(task) });
        true
    }

    /// Stop polling and wait for the task to exit. No-op if not running.
    pub async fn stop(&self) {
        let handle = self.running.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
            log::info!("Status poller stopped");
        }
    }
}

async fn poll_loop<A: SentinelApi>(
    api: Arc<A>,
    state: StateHandle,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick completes immediately
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let ticket = state.begin_poll();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = api.status() => outcome,
        };

        if cancel.is_cancelled() {
            break;
        }

        match state.apply_poll(ticket, outcome, Local::now()) {
            PollApplied::Ignored => break,
            applied => log::trace!("Status poll applied: {:?}", applied),
        }
    }

    log::debug!("Status poll loop exited");
}
