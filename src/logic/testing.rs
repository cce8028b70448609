//! In-memory Sentinel double for engine tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::api::types::{MessageResponse, Snapshot, StartRequest};
use crate::api::SentinelApi;
use crate::error::ApiError;

type Reply<T> = Result<T, ApiError>;

/// Replays queued replies; each endpoint can be held behind a gate
pub(crate) struct ScriptedApi {
    statuses: Mutex<VecDeque<Reply<Snapshot>>>,
    default_status: Mutex<Option<Reply<Snapshot>>>,
    start_replies: Mutex<VecDeque<Reply<MessageResponse>>>,
    stop_replies: Mutex<VecDeque<Reply<MessageResponse>>>,
    start_requests: Mutex<Vec<StartRequest>>,
    status_gate: Mutex<Option<Arc<Semaphore>>>,
    command_gate: Mutex<Option<Arc<Semaphore>>>,
    status_calls: AtomicUsize,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            default_status: Mutex::new(None),
            start_replies: Mutex::new(VecDeque::new()),
            stop_replies: Mutex::new(VecDeque::new()),
            start_requests: Mutex::new(Vec::new()),
            status_gate: Mutex::new(None),
            command_gate: Mutex::new(None),
            status_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push_status(&self, reply: Reply<Snapshot>) {
        self.statuses.lock().push_back(reply);
    }

    /// Returned once the queue is empty
    pub(crate) fn set_default_status(&self, reply: Reply<Snapshot>) {
        *self.default_status.lock() = Some(reply);
    }

    pub(crate) fn push_start(&self, reply: Reply<MessageResponse>) {
        self.start_replies.lock().push_back(reply);
    }

    pub(crate) fn push_stop(&self, reply: Reply<MessageResponse>) {
        self.stop_replies.lock().push_back(reply);
    }

    /// Status calls block until a permit is added
    pub(crate) fn gate_status(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.status_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Start/stop calls block until a permit is added
    pub(crate) fn gate_commands(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.command_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn start_requests(&self) -> Vec<StartRequest> {
        self.start_requests.lock().clone()
    }

    async fn pass(gate: Option<Arc<Semaphore>>) {
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

impl SentinelApi for ScriptedApi {
    async fn status(&self) -> Result<Snapshot, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.status_gate.lock().clone();
        Self::pass(gate).await;

        let queued = self.statuses.lock().pop_front();
        match queued {
            Some(reply) => reply,
            None => self
                .default_status
                .lock()
                .clone()
                .unwrap_or_else(|| Err(ApiError::Network("no scripted status".into()))),
        }
    }

    async fn start(&self, request: StartRequest) -> Result<MessageResponse, ApiError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.start_requests.lock().push(request);
        let gate = self.command_gate.lock().clone();
        Self::pass(gate).await;

        let queued = self.start_replies.lock().pop_front();
        queued.unwrap_or_else(|| Ok(MessageResponse::default()))
    }

    async fn stop(&self) -> Result<MessageResponse, ApiError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.command_gate.lock().clone();
        Self::pass(gate).await;

        let queued = self.stop_replies.lock().pop_front();
        queued.unwrap_or_else(|| Ok(MessageResponse::default()))
    }
}
