//! Document store contract consumed by the graph engine.
//!
//! # Responsibility
//! - Define the async boundary to the engine that owns notes and schemas.
//! - Keep store-specific parsing and link resolution outside this crate.
//!
//! # Invariants
//! - Every query fails with [`StoreError::EngineNotReady`] until the store has
//!   finished initializing.
//! - `children_of` returns children in declaration order and omits ids the
//!   store cannot resolve.

use crate::model::document::{DocumentHandle, DocumentKind};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod memory;

pub use memory::{InMemoryDocumentStore, SchemaEntry, SchemaModuleSnapshot, SnapshotError, WorkspaceSnapshot};

/// Result type used by document store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store has not finished initializing; callers should retry later.
    EngineNotReady,
    /// Store-specific failure carried as a message.
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EngineNotReady => write!(f, "document engine is not ready"),
            Self::Backend(message) => write!(f, "document store failure: {message}"),
        }
    }
}

impl Error for StoreError {}

/// Source tree-of-record for notes and schemas.
///
/// All methods may suspend; implementations must be `Send + Sync` so one
/// store can serve concurrent rebuilds for different view keys.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns whether the store finished initializing.
    fn is_ready(&self) -> bool;

    /// Workspace directory every document path is resolved against.
    fn workspace_root(&self) -> PathBuf;

    /// Lists structural roots for `kind`.
    ///
    /// Notes: every hierarchy root. Schemas: the root schema of every
    /// non-root schema module.
    async fn list_roots(&self, kind: DocumentKind) -> StoreResult<Vec<DocumentHandle>>;

    /// Resolves direct children of one handle.
    async fn children_of(&self, handle: &DocumentHandle) -> StoreResult<Vec<DocumentHandle>>;

    /// Resolves the parent of one handle, if it has one.
    async fn parent_of(&self, handle: &DocumentHandle) -> StoreResult<Option<DocumentHandle>>;

    /// Finds the handle stored at `path` (schemas: the module root schema).
    async fn find_by_path(
        &self,
        kind: DocumentKind,
        path: &str,
    ) -> StoreResult<Option<DocumentHandle>>;

    /// Re-synchronizes the store with disk. May take arbitrary time.
    async fn sync(&self) -> StoreResult<()>;
}
