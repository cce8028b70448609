//! Command Coordinator - start/stop/whitelist actions
//!
//! Turns user intent into Sentinel calls and folds the result back into the
//! store. One command may be outstanding at a time; a second one is
//! rejected locally. Whitelist edits never touch the network.

use std::sync::Arc;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::api::types::{MessageResponse, StartRequest};
use crate::api::SentinelApi;
use crate::constants;
use crate::error::{SentinelError, SentinelResult, ValidationError};
use crate::logic::state::StateHandle;

pub struct CommandCoordinator<A: SentinelApi> {
    api: Arc<A>,
    state: StateHandle,
    session: CancellationToken,
}

impl<A: SentinelApi> Clone for CommandCoordinator<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: self.state.clone(),
            session: self.session.clone(),
        }
    }
}

impl<A: SentinelApi> CommandCoordinator<A> {
    pub fn new(api: Arc<A>, state: StateHandle, session: CancellationToken) -> Self {
        Self { api, state, session }
    }

    /// Start monitoring `path` with the current whitelist.
    ///
    /// Returns the folder the server confirmed.
    pub async fn start_monitoring(&self, path: &str) -> SentinelResult<String> {
        let path = path.trim();
        if path.is_empty() {
            return Err(self.reject(ValidationError::EmptyPath));
        }

        let guard = self.state.begin_command()?;
        let request = StartRequest {
            path: path.to_string(),
            whitelist: guard.whitelist().to_vec(),
        };

        let result = tokio::select! {
            biased;
            _ = self.session.cancelled() => return Err(SentinelError::SessionClosed),
            result = self.api.start(request) => result,
        };

        match result {
            Ok(response) => {
                let folder = confirmed_folder(&response, path);
                if !guard.finish_start(folder.clone(), Local::now()) {
                    return Err(SentinelError::SessionClosed);
                }
                log::info!("Monitoring started on {}", folder);
                Ok(folder)
            }
            Err(e) => {
                log::error!("Start failed: {}", e);
                let err = SentinelError::from_command(e, constants::START_FAILED_MESSAGE);
                guard.fail(&err);
                Err(err)
            }
        }
    }

    /// Stop monitoring. Safe to call while already idle.
    pub async fn stop_monitoring(&self) -> SentinelResult<()> {
        let guard = self.state.begin_command()?;

        let result = tokio::select! {
            biased;
            _ = self.session.cancelled() => return Err(SentinelError::SessionClosed),
            result = self.api.stop() => result,
        };

        match result {
            Ok(_) => {
                if !guard.finish_stop() {
                    return Err(SentinelError::SessionClosed);
                }
                log::info!("Monitoring stopped");
                Ok(())
            }
            Err(e) => {
                log::error!("Stop failed: {}", e);
                let err = SentinelError::from_command(e, constants::STOP_FAILED_MESSAGE);
                guard.fail(&err);
                Err(err)
            }
        }
    }

    /// Add a whitelist path. Only allowed while idle.
    pub fn add_to_whitelist(&self, path: &str) -> SentinelResult<()> {
        self.state.add_whitelist(path)?;
        log::info!("Added to whitelist: {}", path.trim());
        Ok(())
    }

    /// Remove a whitelist path. Returns false if it was not listed.
    pub fn remove_from_whitelist(&self, path: &str) -> SentinelResult<bool> {
        let removed = self.state.remove_whitelist(path)?;
        if removed {
            log::info!("Removed from whitelist: {}", path.trim());
        }
        Ok(removed)
    }

    pub fn get_whitelist(&self) -> Vec<String> {
        self.state.whitelist()
    }

    fn reject(&self, validation: ValidationError) -> SentinelError {
        let err = SentinelError::Validation(validation);
        self.state.record_error(&err);
        err
    }
}

/// Folder echoed in `"Monitoring started on <path>"`, else the requested one
fn confirmed_folder(response: &MessageResponse, requested: &str) -> String {
    response
        .message
        .as_deref()
        .and_then(|m| m.strip_prefix(constants::START_CONFIRMATION_PREFIX))
        .map(str::trim)
        .filter(|folder| !folder.is_empty())
        .unwrap_or(requested)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Snapshot;
    use crate::error::ApiError;
    use crate::logic::history::HistoryPoint;
    use crate::logic::testing::ScriptedApi;

    fn coordinator(api: &Arc<ScriptedApi>) -> (CommandCoordinator<ScriptedApi>, StateHandle) {
        let state = StateHandle::new(20);
        let commands = CommandCoordinator::new(Arc::clone(api), state.clone(), CancellationToken::new());
        (commands, state)
    }

    async fn start_on(commands: &CommandCoordinator<ScriptedApi>, api: &ScriptedApi, path: &str) {
        api.push_start(Ok(MessageResponse::with_message(format!("Monitoring started on {}", path))));
        commands.start_monitoring(path).await.unwrap();
    }

    #[test]
    fn test_confirmed_folder_parsing() {
        let echoed = MessageResponse::with_message("Monitoring started on /abs/data");
        assert_eq!(confirmed_folder(&echoed, "data"), "/abs/data");

        let other = MessageResponse::with_message("ok");
        assert_eq!(confirmed_folder(&other, "/data"), "/data");
        assert_eq!(confirmed_folder(&MessageResponse::default(), "/data"), "/data");
    }

    #[tokio::test]
    async fn test_start_success_seeds_history() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, state) = coordinator(&api);
        api.push_start(Ok(MessageResponse::with_message("Monitoring started on /data")));

        let folder = commands.start_monitoring("/data").await.unwrap();

        assert_eq!(folder, "/data");
        let view = state.view();
        assert!(view.is_monitoring);
        assert_eq!(view.monitored_folder, "/data");
        assert_eq!(view.history.len(), 1);
        assert_eq!(view.history[0].score, 0.0);
        assert!(!view.command_in_flight);
        assert_eq!(
            api.start_requests(),
            vec![StartRequest { path: "/data".into(), whitelist: vec![] }]
        );
    }

    #[tokio::test]
    async fn test_start_sends_whitelist() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, _state) = coordinator(&api);
        commands.add_to_whitelist("/data/cache").unwrap();
        commands.add_to_whitelist("/data/build").unwrap();

        start_on(&commands, &api, "/data").await;

        assert_eq!(
            api.start_requests()[0].whitelist,
            vec!["/data/cache".to_string(), "/data/build".to_string()]
        );
    }

    #[tokio::test]
    async fn test_start_with_empty_path_never_calls_server() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, state) = coordinator(&api);

        let err = commands.start_monitoring("  ").await.unwrap_err();

        assert_eq!(err, SentinelError::Validation(ValidationError::EmptyPath));
        assert_eq!(api.start_calls(), 0);
        assert!(!state.is_monitoring());
        assert_eq!(state.last_error().as_deref(), Some("Please specify a folder to monitor."));
    }

    #[tokio::test]
    async fn test_start_rejection_surfaces_server_message() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, state) = coordinator(&api);
        api.push_start(Err(ApiError::Server {
            status: 500,
            message: Some("Failed to start monitoring on /nope".into()),
        }));

        let err = commands.start_monitoring("/nope").await.unwrap_err();

        assert!(matches!(err, SentinelError::CommandRejected { status: 500, .. }));
        assert!(!state.is_monitoring());
        assert!(state.history().is_empty());
        assert_eq!(state.last_error().as_deref(), Some("Failed to start monitoring on /nope"));
    }

    #[tokio::test]
    async fn test_start_network_failure_uses_fallback() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, state) = coordinator(&api);
        api.push_start(Err(ApiError::Network("connection refused".into())));

        commands.start_monitoring("/data").await.unwrap_err();

        assert_eq!(state.last_error().as_deref(), Some(constants::START_FAILED_MESSAGE));
        assert!(!state.command_in_flight());
    }

    #[tokio::test]
    async fn test_stop_success_resets_server_fields() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, state) = coordinator(&api);
        start_on(&commands, &api, "/data").await;
        let ticket = state.begin_poll();
        state.apply_poll(
            ticket,
            Ok(Snapshot { is_monitoring: true, threat_score: 12.0, ..Default::default() }),
            Local::now(),
        );

        commands.stop_monitoring().await.unwrap();

        let view = state.view();
        assert!(!view.is_monitoring);
        assert_eq!(view.threat_score, 0.0);
        assert!(view.logs.is_empty());
        assert!(view.quarantined_files.is_empty());
        assert!(view.monitored_folder.is_empty());
        assert!(view.history.is_empty());
    }

    #[tokio::test]
    async fn test_stop_rejection_leaves_monitoring() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, state) = coordinator(&api);
        start_on(&commands, &api, "/data").await;
        api.push_stop(Err(ApiError::Server { status: 409, message: Some("busy".into()) }));

        let err = commands.stop_monitoring().await.unwrap_err();

        assert_eq!(err.to_string(), "busy");
        assert!(state.is_monitoring());
        assert_eq!(state.last_error().as_deref(), Some("busy"));
        assert_eq!(state.view().monitored_folder, "/data");
    }

    #[tokio::test]
    async fn test_stop_while_idle_is_harmless() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, state) = coordinator(&api);
        commands.add_to_whitelist("/keep").unwrap();

        commands.stop_monitoring().await.unwrap();
        commands.stop_monitoring().await.unwrap();
        assert_eq!(api.stop_calls(), 2);

        let view = state.view();
        assert!(!view.is_monitoring);
        assert_eq!(view.whitelist, vec!["/keep".to_string()]);
        assert!(view.last_error.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_start_rejected() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, state) = coordinator(&api);
        let gate = api.gate_commands();
        api.push_start(Ok(MessageResponse::with_message("Monitoring started on /data")));

        let first = tokio::spawn({
            let commands = commands.clone();
            async move { commands.start_monitoring("/data").await }
        });
        while !state.command_in_flight() {
            tokio::task::yield_now().await;
        }

        let second = commands.start_monitoring("/data").await.unwrap_err();
        assert_eq!(second, SentinelError::Validation(ValidationError::CommandInFlight));
        assert!(commands.add_to_whitelist("/late").is_err());

        gate.add_permits(1);
        assert_eq!(first.await.unwrap().unwrap(), "/data");
        assert_eq!(api.start_calls(), 1);
        assert!(state.is_monitoring());
    }

    #[tokio::test]
    async fn test_whitelist_edits_rejected_while_monitoring() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, state) = coordinator(&api);
        commands.add_to_whitelist("/a").unwrap();
        start_on(&commands, &api, "/data").await;

        assert!(commands.add_to_whitelist("/b").unwrap_err().is_validation());
        assert!(commands.remove_from_whitelist("/a").unwrap_err().is_validation());
        assert_eq!(commands.get_whitelist(), vec!["/a".to_string()]);
        assert_eq!(api.status_calls(), 0);

        commands.stop_monitoring().await.unwrap();
        assert!(commands.remove_from_whitelist("/a").unwrap());
        assert!(!commands.remove_from_whitelist("/a").unwrap());
        assert!(state.whitelist().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_whitelist_rejected() {
        let api = Arc::new(ScriptedApi::new());
        let (commands, _state) = coordinator(&api);
        commands.add_to_whitelist("/a").unwrap();

        let err = commands.add_to_whitelist("/a").unwrap_err();
        assert_eq!(err, SentinelError::Validation(ValidationError::DuplicatePath("/a".into())));
        assert_eq!(commands.get_whitelist().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_session_drops_result() {
        let api = Arc::new(ScriptedApi::new());
        let state = StateHandle::new(20);
        let session = CancellationToken::new();
        let commands = CommandCoordinator::new(Arc::clone(&api), state.clone(), session.clone());
        let gate = api.gate_commands();

        let pending = tokio::spawn({
            let commands = commands.clone();
            async move { commands.start_monitoring("/data").await }
        });
        while api.start_calls() == 0 {
            tokio::task::yield_now().await;
        }
        session.cancel();
        state.close();
        gate.add_permits(1);

        assert_eq!(pending.await.unwrap(), Err(SentinelError::SessionClosed));
        assert!(!state.is_monitoring());
        assert_eq!(state.history(), Vec::<HistoryPoint>::new());
    }
}
