//! Graph view services.
//!
//! # Responsibility
//! - Orchestrate store queries, graph builds and surface updates.
//! - Keep host integrations decoupled from registry and locking details.

pub mod change_watcher;
pub mod commands;
pub mod sync_coordinator;
pub(crate) mod view_state;
