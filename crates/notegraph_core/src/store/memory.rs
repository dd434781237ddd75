//! In-memory document store backed by a workspace snapshot.
//!
//! # Responsibility
//! - Implement [`DocumentStore`] over plain maps for tests and the CLI.
//! - Load workspace snapshots from JSON.
//!
//! # Invariants
//! - Notes are indexed by store id; schemas by module file name, then id.
//! - Schema children resolve inside their own module only.
//! - Lookups never hold the state lock across a suspension point.

use crate::graph::identity::{document_path, rules_for};
use crate::model::document::{DocumentHandle, DocumentKind, NoteHandle, SchemaHandle, ROOT_FNAME};
use crate::model::graph::same_path;
use crate::store::{DocumentStore, StoreError, StoreResult};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

/// One schema entry inside a snapshot module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

/// One schema module (one `.yml` file) in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModuleSnapshot {
    pub fname: String,
    #[serde(default)]
    pub vault: Option<String>,
    /// Id of the module's root schema.
    pub root: String,
    #[serde(default)]
    pub schemas: Vec<SchemaEntry>,
}

/// Serialized workspace content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub workspace_root: PathBuf,
    #[serde(default)]
    pub notes: Vec<NoteHandle>,
    #[serde(default)]
    pub schema_modules: Vec<SchemaModuleSnapshot>,
}

/// Snapshot loading errors.
#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// Schema module root id does not name a schema in that module.
    MissingModuleRoot { module: String, root: String },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read workspace snapshot: {err}"),
            Self::Parse(err) => write!(f, "invalid workspace snapshot: {err}"),
            Self::MissingModuleRoot { module, root } => {
                write!(f, "schema module `{module}` has no root schema `{root}`")
            }
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::MissingModuleRoot { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct SchemaModule {
    root: String,
    schemas: BTreeMap<String, SchemaHandle>,
}

#[derive(Debug, Default)]
struct StoreState {
    notes: BTreeMap<String, NoteHandle>,
    modules: BTreeMap<String, SchemaModule>,
}

/// Map-backed store; ready by default.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    workspace_root: PathBuf,
    state: RwLock<StoreState>,
    ready: AtomicBool,
    sync_calls: AtomicUsize,
}

impl InMemoryDocumentStore {
    /// Creates an empty, ready store rooted at `workspace_root`.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            state: RwLock::new(StoreState::default()),
            ready: AtomicBool::new(true),
            sync_calls: AtomicUsize::new(0),
        }
    }

    /// Builds a store from one snapshot.
    pub fn from_snapshot(snapshot: WorkspaceSnapshot) -> Result<Self, SnapshotError> {
        let store = Self::new(snapshot.workspace_root);
        for note in snapshot.notes {
            store.upsert_note(note);
        }
        for module in snapshot.schema_modules {
            store.upsert_schema_module(module)?;
        }
        Ok(store)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: WorkspaceSnapshot =
            serde_json::from_str(raw).map_err(SnapshotError::Parse)?;
        Self::from_snapshot(snapshot)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = std::fs::read_to_string(path).map_err(SnapshotError::Io)?;
        Self::from_json_str(raw.as_str())
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Number of completed `sync` calls.
    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    /// Inserts or replaces one note.
    pub fn upsert_note(&self, note: NoteHandle) {
        if let Ok(mut state) = self.state.write() {
            state.notes.insert(note.id.clone(), note);
        }
    }

    /// Removes one note and unlinks it from its parent's children.
    pub fn remove_note(&self, id: &str) -> Option<NoteHandle> {
        let mut state = self.state.write().ok()?;
        let removed = state.notes.remove(id)?;
        if let Some(parent) = removed
            .parent
            .as_ref()
            .and_then(|parent_id| state.notes.get_mut(parent_id))
        {
            parent.children.retain(|child| child != id);
        }
        Some(removed)
    }

    /// Inserts or replaces one schema module.
    pub fn upsert_schema_module(&self, module: SchemaModuleSnapshot) -> Result<(), SnapshotError> {
        if !module.schemas.iter().any(|entry| entry.id == module.root) {
            return Err(SnapshotError::MissingModuleRoot {
                module: module.fname,
                root: module.root,
            });
        }

        let schemas = module
            .schemas
            .into_iter()
            .map(|entry| {
                let handle = SchemaHandle {
                    id: entry.id.clone(),
                    title: entry.title,
                    module: module.fname.clone(),
                    vault: module.vault.clone(),
                    children: entry.children,
                };
                (entry.id, handle)
            })
            .collect();

        if let Ok(mut state) = self.state.write() {
            state.modules.insert(
                module.fname,
                SchemaModule {
                    root: module.root,
                    schemas,
                },
            );
        }
        Ok(())
    }

    fn read_state(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        if !self.is_ready() {
            return Err(StoreError::EngineNotReady);
        }
        self.state
            .read()
            .map_err(|_| StoreError::Backend("store state lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn workspace_root(&self) -> PathBuf {
        self.workspace_root.clone()
    }

    async fn list_roots(&self, kind: DocumentKind) -> StoreResult<Vec<DocumentHandle>> {
        let state = self.read_state()?;
        let roots = match kind {
            DocumentKind::Note => state
                .notes
                .values()
                .filter(|note| note.is_root())
                .cloned()
                .map(DocumentHandle::Note)
                .collect(),
            DocumentKind::Schema => state
                .modules
                .iter()
                .filter(|(fname, _)| fname.as_str() != ROOT_FNAME)
                .filter_map(|(_, module)| module.schemas.get(&module.root))
                .cloned()
                .map(DocumentHandle::Schema)
                .collect(),
        };
        Ok(roots)
    }

    async fn children_of(&self, handle: &DocumentHandle) -> StoreResult<Vec<DocumentHandle>> {
        let state = self.read_state()?;
        let mut children = Vec::with_capacity(handle.children().len());
        for child_id in handle.children() {
            let resolved = match handle {
                DocumentHandle::Note(_) => state.notes.get(child_id).cloned().map(DocumentHandle::Note),
                DocumentHandle::Schema(schema) => state
                    .modules
                    .get(&schema.module)
                    .and_then(|module| module.schemas.get(child_id))
                    .cloned()
                    .map(DocumentHandle::Schema),
            };
            match resolved {
                Some(child) => children.push(child),
                None => debug!(
                    "event=child_unresolved module=store status=skip parent={} child={}",
                    handle.internal_id(),
                    child_id
                ),
            }
        }
        Ok(children)
    }

    async fn parent_of(&self, handle: &DocumentHandle) -> StoreResult<Option<DocumentHandle>> {
        let state = self.read_state()?;
        let parent = match handle {
            DocumentHandle::Note(note) => note
                .parent
                .as_ref()
                .and_then(|parent_id| state.notes.get(parent_id))
                .cloned()
                .map(DocumentHandle::Note),
            DocumentHandle::Schema(schema) => state.modules.get(&schema.module).and_then(|module| {
                module
                    .schemas
                    .values()
                    .find(|candidate| candidate.children.contains(&schema.id))
                    .cloned()
                    .map(DocumentHandle::Schema)
            }),
        };
        Ok(parent)
    }

    async fn find_by_path(
        &self,
        kind: DocumentKind,
        path: &str,
    ) -> StoreResult<Option<DocumentHandle>> {
        if !path.ends_with(rules_for(kind).extension) {
            return Ok(None);
        }
        let state = self.read_state()?;
        let root = self.workspace_root.as_path();
        let found = match kind {
            DocumentKind::Note => state
                .notes
                .values()
                .map(|note| DocumentHandle::Note(note.clone()))
                .find(|handle| same_path(document_path(handle, root).as_str(), path)),
            DocumentKind::Schema => state
                .modules
                .values()
                .filter_map(|module| module.schemas.get(&module.root))
                .map(|schema| DocumentHandle::Schema(schema.clone()))
                .find(|handle| same_path(document_path(handle, root).as_str(), path)),
        };
        Ok(found)
    }

    async fn sync(&self) -> StoreResult<()> {
        if !self.is_ready() {
            return Err(StoreError::EngineNotReady);
        }
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryDocumentStore, SnapshotError};
    use crate::model::document::{DocumentHandle, DocumentKind};
    use crate::store::{DocumentStore, StoreError};

    const SNAPSHOT: &str = r#"{
        "workspaceRoot": "/ws",
        "notes": [
            {"id": "r", "fname": "root", "title": "Root", "children": ["a", "gone"]},
            {"id": "a", "fname": "alpha", "title": "Alpha", "parent": "r"}
        ],
        "schemaModules": [
            {"fname": "root", "root": "root", "schemas": [{"id": "root"}]},
            {"fname": "journal.schema", "root": "journal",
             "schemas": [{"id": "journal", "children": ["day"]}, {"id": "day"}]}
        ]
    }"#;

    #[tokio::test]
    async fn lists_roots_per_kind() {
        let store = InMemoryDocumentStore::from_json_str(SNAPSHOT).expect("snapshot");
        let notes = store.list_roots(DocumentKind::Note).await.expect("note roots");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].internal_id(), "r");

        let schemas = store.list_roots(DocumentKind::Schema).await.expect("schema roots");
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].internal_id(), "journal");
    }

    #[tokio::test]
    async fn children_skip_unresolved_ids() {
        let store = InMemoryDocumentStore::from_json_str(SNAPSHOT).expect("snapshot");
        let roots = store.list_roots(DocumentKind::Note).await.expect("roots");
        let children = store.children_of(&roots[0]).await.expect("children");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].internal_id(), "a");

        let parent = store.parent_of(&children[0]).await.expect("parent");
        assert_eq!(parent.map(|p| p.internal_id().to_string()), Some("r".to_string()));
    }

    #[tokio::test]
    async fn finds_handles_by_path() {
        let store = InMemoryDocumentStore::from_json_str(SNAPSHOT).expect("snapshot");
        let note = store
            .find_by_path(DocumentKind::Note, "/ws/alpha.md")
            .await
            .expect("lookup");
        assert!(matches!(note, Some(DocumentHandle::Note(ref n)) if n.id == "a"));

        let schema = store
            .find_by_path(DocumentKind::Schema, "/ws/journal.schema.yml")
            .await
            .expect("lookup");
        assert_eq!(schema.map(|s| s.internal_id().to_string()), Some("journal".to_string()));

        let miss = store
            .find_by_path(DocumentKind::Note, "/ws/journal.schema.yml")
            .await
            .expect("lookup");
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn not_ready_store_rejects_queries() {
        let store = InMemoryDocumentStore::from_json_str(SNAPSHOT).expect("snapshot");
        store.set_ready(false);
        let err = store
            .list_roots(DocumentKind::Note)
            .await
            .expect_err("not-ready store must fail");
        assert_eq!(err, StoreError::EngineNotReady);
        assert_eq!(store.sync().await, Err(StoreError::EngineNotReady));
        assert_eq!(store.sync_calls(), 0);
    }

    #[test]
    fn rejects_module_without_root_schema() {
        let err = InMemoryDocumentStore::from_json_str(
            r#"{"workspaceRoot": "/ws", "schemaModules": [{"fname": "x", "root": "missing"}]}"#,
        )
        .expect_err("missing root must fail");
        assert!(matches!(err, SnapshotError::MissingModuleRoot { .. }));
    }
}
