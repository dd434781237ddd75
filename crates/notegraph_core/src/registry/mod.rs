//! View registry.

pub mod view_registry;
