//! Sentinel Session - wiring for one client lifetime
//!
//! Owns the store, the poller and the command coordinator. Opening a session
//! starts polling; shutting it down (or dropping it) cancels every
//! outstanding request and freezes the store.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{SentinelApi, SentinelClient};
use crate::error::{SentinelError, SentinelResult};
use crate::logic::commands::CommandCoordinator;
use crate::logic::config::SentinelConfig;
use crate::logic::poller::Poller;
use crate::logic::state::StateHandle;

pub struct SentinelSession<A: SentinelApi = SentinelClient> {
    config: SentinelConfig,
    state: StateHandle,
    poller: Poller<A>,
    commands: CommandCoordinator<A>,
    cancel: CancellationToken,
}

impl SentinelSession<SentinelClient> {
    /// Open a session against the HTTP service described by `config`
    pub fn connect(config: SentinelConfig) -> SentinelResult<Self> {
        let client = SentinelClient::new(&config)
            .map_err(|e| SentinelError::Setup(e.to_string()))?;
        log::info!("Connecting to Sentinel at {}", client.base_url());
        Ok(Self::open(client, config))
    }
}

impl<A: SentinelApi> SentinelSession<A> {
    /// Open a session over any transport and start polling.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(api: A, config: SentinelConfig) -> Self {
        let api = Arc::new(api);
        let cancel = CancellationToken::new();
        let state = StateHandle::new(config.history_capacity);

        let poller = Poller::new(Arc::clone(&api), state.clone(), config.poll_interval(), cancel.clone());
        let commands = CommandCoordinator::new(api, state.clone(), cancel.clone());

        poller.start();

        Self {
            config,
            state,
            poller,
            commands,
            cancel,
        }
    }

    pub fn config(&self) -> &SentinelConfig {
        &self.config
    }

    /// Read-only state for presentation
    pub fn state(&self) -> StateHandle {
        self.state.clone()
    }

    pub fn commands(&self) -> &CommandCoordinator<A> {
        &self.commands
    }

    pub fn poller(&self) -> &Poller<A> {
        &self.poller
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel everything and wait for the poller to exit
    pub async fn shutdown(self) {
        self.teardown();
        self.poller.stop().await;
        log::info!("Sentinel session closed");
    }

    fn teardown(&self) {
        self.cancel.cancel();
        self.state.close();
    }
}

impl<A: SentinelApi> Drop for SentinelSession<A> {
    fn drop(&mut self) {
        self.teardown();
    }
}
