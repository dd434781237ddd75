//! Full-rebuild orchestration and event routing.
//!
//! # Responsibility
//! - Show or reload the graph view of one kind (optionally after a store
//!   sync).
//! - Reload every kind concurrently with isolated failures.
//! - Route host events to the attached [`ChangeWatcher`]s.
//!
//! # Invariants
//! - Rebuilds for one view key never interleave; different keys may run
//!   concurrently.
//! - A failed rebuild leaves the registry and any live view untouched.
//! - `NoRootFound` is reported to the user exactly once per failed attempt.
//! - Repeated shows for a key reuse the same view until its surface closes.

use crate::config::GraphConfig;
use crate::graph::builder::{GraphBuilder, GraphError};
use crate::graph::identity::rules_for;
use crate::model::document::DocumentKind;
use crate::model::graph::Graph;
use crate::model::view::{View, ViewId, ViewKey};
use crate::service::change_watcher::{ChangeWatcher, FileEvent};
use crate::service::view_state::ViewState;
use crate::store::{DocumentStore, StoreError};
use crate::surface::{
    FileOpener, InboundMessage, Notifier, OutboundMessage, RenderSurface, SurfaceFactory,
    WebviewTemplate,
};
use futures::future::join_all;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

pub(crate) const STILL_CONNECTING_NOTICE: &str =
    "still connecting to engine. please try again in a few moments...";
pub(crate) const SYNC_PROGRESS_TITLE: &str = "Syncing...";
pub(crate) const LOADING_PROGRESS_TITLE: &str = "Loading...";
pub(crate) const GRAPHS_RELOADED_NOTICE: &str = "graphs reloaded";
pub(crate) const STORE_SYNCED_NOTICE: &str = "updated graph";

/// Errors from coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Store still initializing; nothing was mutated.
    EngineNotReady,
    /// No root for the kind; the view was not updated.
    NoRootFound(DocumentKind),
    /// Store query or sync failure.
    Store(StoreError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EngineNotReady => write!(f, "document engine is not ready"),
            Self::NoRootFound(kind) => write!(f, "no root found for {kind}s"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::EngineNotReady => Self::EngineNotReady,
            other => Self::Store(other),
        }
    }
}

impl From<GraphError> for SyncError {
    fn from(value: GraphError) -> Self {
        match value {
            GraphError::NoRootFound(kind) => Self::NoRootFound(kind),
            GraphError::Store(err) => err.into(),
        }
    }
}

/// Options for [`SyncCoordinator::show_or_reload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowOptions {
    /// Skip posting the rebuilt graph to the surface.
    pub silent: bool,
    /// Run `DocumentStore::sync` before rebuilding.
    pub sync: bool,
}

impl ShowOptions {
    pub fn synced() -> Self {
        Self {
            sync: true,
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }
}

/// Successful show/reload summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowOutcome {
    pub view_id: ViewId,
    /// The view (and its surface) was created by this call.
    pub first_launch: bool,
    pub nodes: usize,
    pub edges: usize,
}

/// Per-kind results of [`SyncCoordinator::reload_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    pub outcomes: Vec<(DocumentKind, Result<ShowOutcome, SyncError>)>,
}

impl ReloadReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, result)| result.is_ok()).count()
    }

    pub fn outcome(&self, kind: DocumentKind) -> Option<&Result<ShowOutcome, SyncError>> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, result)| result)
    }

    pub fn first_error(&self) -> Option<&SyncError> {
        self.outcomes
            .iter()
            .find_map(|(_, result)| result.as_ref().err())
    }
}

/// Host event routed through [`SyncCoordinator::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Editor opened a document.
    DocumentOpened { path: String },
    /// A surface posted a message.
    SurfaceMessage { key: ViewKey, message: InboundMessage },
    /// The user closed a surface.
    SurfaceDisposed { key: ViewKey },
    File(FileEvent),
}

/// Host collaborators required by the coordinator.
pub struct Collaborators {
    pub store: Arc<dyn DocumentStore>,
    pub surfaces: Arc<dyn SurfaceFactory>,
    pub opener: Arc<dyn FileOpener>,
    pub notifier: Arc<dyn Notifier>,
}

/// Owns the view registry and orchestrates rebuilds.
pub struct SyncCoordinator {
    store: Arc<dyn DocumentStore>,
    surfaces: Arc<dyn SurfaceFactory>,
    opener: Arc<dyn FileOpener>,
    notifier: Arc<dyn Notifier>,
    config: Arc<GraphConfig>,
    template: WebviewTemplate,
    state: Arc<ViewState>,
    watchers: Mutex<BTreeMap<ViewKey, Arc<ChangeWatcher>>>,
}

impl SyncCoordinator {
    /// Creates a coordinator with an empty registry and the built-in template.
    pub fn new(collaborators: Collaborators, config: GraphConfig) -> Self {
        Self {
            store: collaborators.store,
            surfaces: collaborators.surfaces,
            opener: collaborators.opener,
            notifier: collaborators.notifier,
            config: Arc::new(config),
            template: WebviewTemplate::default(),
            state: Arc::new(ViewState::new()),
            watchers: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_template(mut self, template: WebviewTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Id of the live view for `key`, if any.
    pub fn view_id(&self, key: ViewKey) -> Option<ViewId> {
        self.state
            .with_registry(|registry| registry.get(key).map(View::id))
    }

    /// Snapshot of the live graph for `key`.
    pub fn graph(&self, key: ViewKey) -> Option<Graph> {
        self.state.snapshot(key).map(|(_, _, graph)| graph)
    }

    /// Whether a watcher is attached for `key`.
    pub fn is_watching(&self, key: ViewKey) -> bool {
        self.lock_watchers().contains_key(&key)
    }

    /// Shows the hierarchy graph for `kind`, creating the view on first use.
    ///
    /// # Errors
    /// - [`SyncError::EngineNotReady`] before the store is initialized.
    /// - [`SyncError::NoRootFound`] when the kind has no root.
    /// - [`SyncError::Store`] for store failures.
    pub async fn show_or_reload(
        &self,
        kind: DocumentKind,
        opts: ShowOptions,
    ) -> Result<ShowOutcome, SyncError> {
        let key = ViewKey::hierarchy(kind);
        let _gate = self.state.lock_key(key).await;

        if !self.store.is_ready() {
            return Err(self.report_failure(key, SyncError::EngineNotReady));
        }

        if opts.sync {
            self.notifier.progress(SYNC_PROGRESS_TITLE, true);
            let synced = self.store.sync().await;
            self.notifier.progress(SYNC_PROGRESS_TITLE, false);
            if let Err(err) = synced {
                return Err(self.report_failure(key, err.into()));
            }
        }

        let builder = GraphBuilder::for_store(kind, self.store.as_ref());
        let graph = match builder.build_from_store(self.store.as_ref()).await {
            Ok(graph) => graph,
            Err(err) => return Err(self.report_failure(key, err.into())),
        };

        let (view_id, surface, first_launch) = self.ensure_view(key);
        if !opts.sync {
            self.notifier.progress(LOADING_PROGRESS_TITLE, true);
        }
        surface.set_content(
            self.template
                .render(self.config.graph_type.as_str(), surface.as_ref()),
        );
        if !opts.sync {
            self.notifier.progress(LOADING_PROGRESS_TITLE, false);
        }

        let outcome = ShowOutcome {
            view_id,
            first_launch,
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
        };
        let refresh = (!opts.silent).then(|| OutboundMessage::Refresh(graph.clone()));
        self.state.with_registry(|registry| {
            if let Some(view) = registry.get_mut(key) {
                view.graph = graph;
            }
        });
        if let Some(message) = refresh {
            surface.post(&message);
        }
        if first_launch {
            self.attach_watcher(key);
        }

        info!(
            "event=graph_show module=service status=ok key={} view={} first_launch={} silent={} sync={} nodes={} edges={}",
            key, view_id, first_launch, opts.silent, opts.sync, outcome.nodes, outcome.edges
        );
        Ok(outcome)
    }

    /// Reloads every kind concurrently, then confirms once.
    ///
    /// One kind failing never prevents another from completing.
    pub async fn reload_all(&self) -> ReloadReport {
        let runs = DocumentKind::ALL.iter().map(|kind| async move {
            (*kind, self.show_or_reload(*kind, ShowOptions::default()).await)
        });
        let report = ReloadReport {
            outcomes: join_all(runs).await,
        };

        self.notifier.info(GRAPHS_RELOADED_NOTICE);
        info!(
            "event=graph_reload_all module=service status={} succeeded={} total={}",
            if report.first_error().is_none() { "ok" } else { "partial" },
            report.succeeded(),
            report.outcomes.len()
        );
        report
    }

    /// Synchronizes the store without rebuilding views.
    pub async fn sync_store(&self) -> Result<(), SyncError> {
        if !self.store.is_ready() {
            self.notifier.info(STILL_CONNECTING_NOTICE);
            return Err(SyncError::EngineNotReady);
        }

        self.notifier.progress(SYNC_PROGRESS_TITLE, true);
        let synced = self.store.sync().await;
        self.notifier.progress(SYNC_PROGRESS_TITLE, false);
        match synced {
            Ok(()) => {
                self.notifier.info(STORE_SYNCED_NOTICE);
                info!("event=store_sync module=service status=ok");
                Ok(())
            }
            Err(err) => {
                let err = SyncError::from(err);
                self.notifier.error(&format!("sync failed: {err}"));
                error!("event=store_sync module=service status=error error={}", err);
                Err(err)
            }
        }
    }

    /// Routes one host event to the attached watchers.
    ///
    /// File events go to every watcher; the first patch error is returned
    /// after all watchers ran.
    pub async fn dispatch(&self, event: WatchEvent) -> Result<(), SyncError> {
        match event {
            WatchEvent::DocumentOpened { path } => {
                for watcher in self.attached_watchers() {
                    watcher.on_document_opened(path.as_str());
                }
                Ok(())
            }
            WatchEvent::SurfaceMessage { key, message } => {
                if let Some(watcher) = self.watcher(key) {
                    watcher.on_surface_message(&message);
                }
                Ok(())
            }
            WatchEvent::SurfaceDisposed { key } => {
                let detached = self.lock_watchers().remove(&key);
                if let Some(watcher) = detached {
                    watcher.on_surface_disposed().await;
                }
                Ok(())
            }
            WatchEvent::File(file_event) => {
                let mut first_error = None;
                for watcher in self.attached_watchers() {
                    if let Err(err) = watcher.on_file_event(&file_event).await {
                        warn!(
                            "event=graph_patch module=service status=error key={} error={}",
                            watcher.key(),
                            err
                        );
                        first_error.get_or_insert(err);
                    }
                }
                first_error.map_or(Ok(()), Err)
            }
        }
    }

    /// Watcher attached for `key`, if its view is live.
    pub fn watcher(&self, key: ViewKey) -> Option<Arc<ChangeWatcher>> {
        self.lock_watchers().get(&key).cloned()
    }

    fn attached_watchers(&self) -> Vec<Arc<ChangeWatcher>> {
        self.lock_watchers().values().cloned().collect()
    }

    fn lock_watchers(&self) -> std::sync::MutexGuard<'_, BTreeMap<ViewKey, Arc<ChangeWatcher>>> {
        self.watchers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach_watcher(&self, key: ViewKey) {
        let watcher = ChangeWatcher::new(
            key,
            Arc::clone(&self.state),
            Arc::clone(&self.store),
            Arc::clone(&self.opener),
            Arc::clone(&self.config),
        );
        self.lock_watchers().insert(key, Arc::new(watcher));
    }

    /// Returns the live view for `key`, creating surface + view if absent.
    fn ensure_view(&self, key: ViewKey) -> (ViewId, Arc<dyn RenderSurface>, bool) {
        let existing = self.state.with_registry(|registry| {
            registry
                .get(key)
                .map(|view| (view.id(), Arc::clone(view.surface())))
        });
        if let Some((view_id, surface)) = existing {
            return (view_id, surface, false);
        }

        let title = format!("{} Links", rules_for(key.kind).display_name);
        let surface = self.surfaces.create(key, title.as_str(), self.config.show_column);
        let view = View::new(key, Arc::clone(&surface));
        let view_id = view.id();
        self.state.with_registry(|registry| registry.set(key, view));
        info!(
            "event=view_created module=service status=ok key={} view={} title={}",
            key, view_id, title
        );
        (view_id, surface, true)
    }

    fn report_failure(&self, key: ViewKey, err: SyncError) -> SyncError {
        match &err {
            SyncError::EngineNotReady => {
                self.notifier.info(STILL_CONNECTING_NOTICE);
                warn!("event=graph_show module=service status=skip key={} reason=engine_not_ready", key);
            }
            SyncError::NoRootFound(_) | SyncError::Store(_) => {
                self.notifier.error(&format!("failed to show {} graph: {err}", key.kind));
                error!("event=graph_show module=service status=error key={} error={}", key, err);
            }
        }
        err
    }
}
