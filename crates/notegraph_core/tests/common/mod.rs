#![allow(dead_code)]

use async_trait::async_trait;
use notegraph_core::{
    Collaborators, DocumentHandle, DocumentKind, DocumentStore, FileOpener, GraphConfig,
    InMemoryDocumentStore, NoteHandle, Notifier, OutboundMessage, RenderSurface, StoreResult,
    SurfaceFactory, SyncCoordinator, ViewColumn, ViewKey,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const WORKSPACE: &str = r#"{
    "workspaceRoot": "/ws",
    "notes": [
        {"id": "r", "fname": "root", "title": "Root", "children": ["a"]},
        {"id": "a", "fname": "alpha", "title": "Alpha", "parent": "r", "children": ["b"]},
        {"id": "b", "fname": "alpha.beta", "title": "Beta", "parent": "a"}
    ],
    "schemaModules": [
        {"fname": "root", "root": "root", "schemas": [{"id": "root"}]},
        {"fname": "journal.schema", "root": "journal", "schemas": [
            {"id": "journal", "title": "Journal", "children": ["year"]},
            {"id": "year", "children": ["month"]},
            {"id": "month"}
        ]}
    ]
}"#;

pub fn store() -> Arc<InMemoryDocumentStore> {
    Arc::new(InMemoryDocumentStore::from_json_str(WORKSPACE).unwrap())
}

pub fn note(id: &str, fname: &str, title: &str, parent: Option<&str>, children: &[&str]) -> NoteHandle {
    NoteHandle {
        id: id.to_string(),
        fname: fname.to_string(),
        title: title.to_string(),
        vault: None,
        parent: parent.map(str::to_string),
        children: children.iter().map(|c| c.to_string()).collect(),
    }
}

/// Store that suspends inside every root, child and sync query and records
/// how many of those queries overlapped.
pub struct YieldingStore {
    inner: InMemoryDocumentStore,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl YieldingStore {
    pub fn new(inner: InMemoryDocumentStore) -> Self {
        Self {
            inner,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Highest number of queries that were suspended at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for YieldingStore {
    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    fn workspace_root(&self) -> PathBuf {
        self.inner.workspace_root()
    }

    async fn list_roots(&self, kind: DocumentKind) -> StoreResult<Vec<DocumentHandle>> {
        self.pause().await;
        self.inner.list_roots(kind).await
    }

    async fn children_of(&self, handle: &DocumentHandle) -> StoreResult<Vec<DocumentHandle>> {
        self.pause().await;
        self.inner.children_of(handle).await
    }

    async fn parent_of(&self, handle: &DocumentHandle) -> StoreResult<Option<DocumentHandle>> {
        self.inner.parent_of(handle).await
    }

    async fn find_by_path(
        &self,
        kind: DocumentKind,
        path: &str,
    ) -> StoreResult<Option<DocumentHandle>> {
        self.inner.find_by_path(kind, path).await
    }

    async fn sync(&self) -> StoreResult<()> {
        self.pause().await;
        self.inner.sync().await
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    pub html: Mutex<Vec<String>>,
    pub posted: Mutex<Vec<OutboundMessage>>,
}

impl RecordingSurface {
    pub fn posted(&self) -> Vec<OutboundMessage> {
        self.posted.lock().unwrap().clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.posted()
            .iter()
            .filter(|message| matches!(message, OutboundMessage::Refresh(_)))
            .count()
    }

    pub fn last_html(&self) -> Option<String> {
        self.html.lock().unwrap().last().cloned()
    }
}

impl RenderSurface for RecordingSurface {
    fn set_content(&self, html: String) {
        self.html.lock().unwrap().push(html);
    }

    fn post(&self, message: &OutboundMessage) -> bool {
        self.posted.lock().unwrap().push(message.clone());
        true
    }

    fn asset_uri(&self, file_name: &str) -> String {
        format!("asset://{file_name}")
    }
}

#[derive(Default)]
pub struct RecordingFactory {
    pub created: Mutex<Vec<(ViewKey, String, ViewColumn, Arc<RecordingSurface>)>>,
}

impl RecordingFactory {
    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn surface(&self, index: usize) -> Arc<RecordingSurface> {
        Arc::clone(&self.created.lock().unwrap()[index].3)
    }

    pub fn title(&self, index: usize) -> String {
        self.created.lock().unwrap()[index].1.clone()
    }
}

impl SurfaceFactory for RecordingFactory {
    fn create(&self, key: ViewKey, title: &str, column: ViewColumn) -> Arc<dyn RenderSurface> {
        let surface = Arc::new(RecordingSurface::default());
        self.created
            .lock()
            .unwrap()
            .push((key, title.to_string(), column, Arc::clone(&surface)));
        surface
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<(String, ViewColumn)>>,
}

impl FileOpener for RecordingOpener {
    fn open(&self, path: &str, column: ViewColumn) -> Result<(), String> {
        self.opened.lock().unwrap().push((path.to_string(), column));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub progress: Mutex<Vec<(String, bool)>>,
}

impl RecordingNotifier {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn progress(&self, title: &str, active: bool) {
        self.progress.lock().unwrap().push((title.to_string(), active));
    }
}

pub struct Harness<S = InMemoryDocumentStore> {
    pub store: Arc<S>,
    pub factory: Arc<RecordingFactory>,
    pub opener: Arc<RecordingOpener>,
    pub notifier: Arc<RecordingNotifier>,
    pub coordinator: SyncCoordinator,
}

pub fn harness_with<S: DocumentStore + 'static>(store: Arc<S>) -> Harness<S> {
    let factory = Arc::new(RecordingFactory::default());
    let opener = Arc::new(RecordingOpener::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let coordinator = SyncCoordinator::new(
        Collaborators {
            store: store.clone(),
            surfaces: factory.clone(),
            opener: opener.clone(),
            notifier: notifier.clone(),
        },
        GraphConfig::default(),
    );
    Harness {
        store,
        factory,
        opener,
        notifier,
        coordinator,
    }
}

pub fn harness() -> Harness {
    harness_with(store())
}
