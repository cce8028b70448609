//! API Module - Sentinel Service Boundary
//!
//! Structure:
//! - types.rs: wire shapes of `/status`, `/start`, `/stop`
//! - client.rs: reqwest implementation of [`SentinelApi`]

use std::future::Future;

pub mod client;
pub mod types;

pub use client::SentinelClient;
pub use types::{LogEntry, LogLevel, MessageResponse, QuarantinedFile, Snapshot, StartRequest};

use crate::error::ApiError;

/// Calls the synchronization engine makes against the remote service.
///
/// Every outcome is a plain `Result`; classification into connectivity
/// failures vs. rejected commands happens in `logic`.
pub trait SentinelApi: Send + Sync + 'static {
    /// `GET /status`
    fn status(&self) -> impl Future<Output = Result<Snapshot, ApiError>> + Send;

    /// `POST /start`
    fn start(&self, request: StartRequest) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send;

    /// `POST /stop`
    fn stop(&self) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send;
}
