//! Logic Module - Synchronization Engine
//!
//! Keeps a local picture of the Sentinel service in step with the server.
//!
//! ## Layout
//! - `state/` - synchronized store and read-only views
//! - `poller` - status polling loop
//! - `commands` - start/stop/whitelist coordinator
//! - `history`, `connection`, `whitelist` - pure building blocks
//! - `session` - wires everything for one client lifetime

pub mod commands;
pub mod config;
pub mod connection;
pub mod history;
pub mod poller;
pub mod session;
pub mod state;
pub mod whitelist;

#[cfg(test)]
pub(crate) mod testing;
