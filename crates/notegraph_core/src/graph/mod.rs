//! Tree-to-graph projection.
//!
//! # Responsibility
//! - Resolve node identity per document kind.
//! - Build flat `{nodes, edges}` graphs from one or more roots.
//!
//! # Invariants
//! - Published graphs never contain dangling edges.

pub mod builder;
pub mod identity;
