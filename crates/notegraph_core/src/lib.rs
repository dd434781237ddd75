//! Hierarchy graph engine for note and schema workspaces.
//! This crate owns graph construction and view lifecycle; document storage
//! and rendering live behind traits implemented by the host.

pub mod config;
pub mod graph;
pub mod logging;
pub mod model;
pub mod registry;
pub mod service;
pub mod store;
pub mod surface;

pub use config::{ConfigError, GraphConfig, LoggingConfig};
pub use graph::builder::{BuildStats, GraphBuilder, GraphError, GraphResult};
pub use graph::identity::{document_path, node_id, rules_for, KindRules};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{DocumentHandle, DocumentKind, NoteHandle, SchemaHandle, ROOT_FNAME};
pub use model::graph::{Graph, GraphEdge, GraphNode};
pub use model::view::{View, ViewId, ViewKey, ViewMode};
pub use registry::view_registry::ViewRegistry;
pub use service::change_watcher::{ChangeWatcher, FileEvent, PatchOutcome};
pub use service::commands::{CommandOutput, GraphCommand};
pub use service::sync_coordinator::{
    Collaborators, ReloadReport, ShowOptions, ShowOutcome, SyncCoordinator, SyncError, WatchEvent,
};
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError, StoreResult, WorkspaceSnapshot};
pub use surface::{
    FileOpener, InboundMessage, Notifier, OutboundMessage, RenderSurface, SurfaceFactory,
    ViewColumn, WebviewTemplate,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
