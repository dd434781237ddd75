//! Domain model for hierarchy graphs.
//!
//! # Responsibility
//! - Define document handles consumed from the store.
//! - Define the flat graph payload and view identity types.
//!
//! # Invariants
//! - Graph node ids are derived from handles, never generated.
//! - One view per `(kind, mode)` key.

pub mod document;
pub mod graph;
pub mod view;
