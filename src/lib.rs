//! Sentinel Sync - state synchronization client for the Sentinel detection service
//!
//! Polls the service status, keeps a bounded threat-score history, tracks
//! reachability, and reconciles start/stop/whitelist commands into one
//! shared state that presentation code reads.

pub mod api;
pub mod constants;
pub mod error;
pub mod logic;

pub use api::{SentinelApi, SentinelClient};
pub use error::{ApiError, SentinelError, SentinelResult, ValidationError};
pub use logic::config::SentinelConfig;
pub use logic::session::SentinelSession;
pub use logic::state::{MonitorPhase, SentinelView, StateHandle, StatusSummary};
