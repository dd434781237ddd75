//! Event translation for one live view.
//!
//! # Responsibility
//! - Relay editor document-open notifications to the surface.
//! - Answer surface `ready` / `click` messages.
//! - Clear the registry slot when the surface is disposed.
//! - Patch the live graph in place for filesystem events.
//!
//! # Invariants
//! - Patches run under the view key's gate, same as full rebuilds.
//! - Renames never change node ids or edges.
//! - Deletes are local: only nodes stored at the deleted path and their
//!   incident edges go away.
//! - A patched graph has no dangling edges.
//! - Create/change patches only add what a full rebuild would reach: a
//!   document whose ancestor chain misses every root or crosses a stub is
//!   removed from the graph instead.

use crate::config::GraphConfig;
use crate::graph::builder::{GraphBuilder, Walk};
use crate::graph::identity::{is_stub_handle, matches_kind_extension, node_id};
use crate::model::document::DocumentHandle;
use crate::model::graph::{Graph, GraphEdge, Upsert};
use crate::model::view::{ViewId, ViewKey};
use crate::service::sync_coordinator::SyncError;
use crate::service::view_state::ViewState;
use crate::store::DocumentStore;
use crate::surface::{FileOpener, InboundMessage, OutboundMessage};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Filesystem change reported by the host watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Changed { path: String },
    Created { path: String },
    Deleted { path: String },
    Renamed { from: String, to: String },
}

impl FileEvent {
    fn paths(&self) -> Vec<&str> {
        match self {
            Self::Changed { path } | Self::Created { path } | Self::Deleted { path } => {
                vec![path.as_str()]
            }
            Self::Renamed { from, to } => vec![from.as_str(), to.as_str()],
        }
    }
}

/// Result of applying one [`FileEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Event filtered out (file type, kind, no live view, unknown document).
    Ignored,
    /// Event matched no node.
    Unchanged,
    /// Graph mutated and re-sent to the surface.
    Applied,
}

/// Watches one view key on behalf of the coordinator.
pub struct ChangeWatcher {
    key: ViewKey,
    state: Arc<ViewState>,
    store: Arc<dyn DocumentStore>,
    opener: Arc<dyn FileOpener>,
    config: Arc<GraphConfig>,
}

impl ChangeWatcher {
    pub(crate) fn new(
        key: ViewKey,
        state: Arc<ViewState>,
        store: Arc<dyn DocumentStore>,
        opener: Arc<dyn FileOpener>,
        config: Arc<GraphConfig>,
    ) -> Self {
        Self {
            key,
            state,
            store,
            opener,
            config,
        }
    }

    pub fn key(&self) -> ViewKey {
        self.key
    }

    /// Posts `fileOpen` for a document the editor just opened.
    pub fn on_document_opened(&self, path: &str) -> bool {
        match self.state.surface(self.key) {
            Some(surface) => surface.post(&OutboundMessage::FileOpen {
                path: path.to_string(),
            }),
            None => false,
        }
    }

    /// Handles one message sent by the surface.
    pub fn on_surface_message(&self, message: &InboundMessage) {
        match message {
            InboundMessage::Ready => {
                self.state.send_graph(self.key);
            }
            InboundMessage::Click { path } => {
                match self.opener.open(path.as_str(), self.config.open_column) {
                    Ok(()) => debug!(
                        "event=node_open module=watcher status=ok key={} path={}",
                        self.key, path
                    ),
                    Err(err) => warn!(
                        "event=node_open module=watcher status=error key={} path={} error={}",
                        self.key, path, err
                    ),
                }
            }
        }
    }

    /// Drops the view for this key after its surface closed.
    pub async fn on_surface_disposed(&self) -> Option<ViewId> {
        let _gate = self.state.lock_key(self.key).await;
        let cleared = self.state.with_registry(|registry| registry.clear(self.key));
        let view_id = cleared.map(|view| view.id());
        info!(
            "event=view_disposed module=watcher status=ok key={} view={}",
            self.key,
            view_id.map(|id| id.to_string()).unwrap_or_default()
        );
        view_id
    }

    /// Patches the live graph for one filesystem event.
    pub async fn on_file_event(&self, event: &FileEvent) -> Result<PatchOutcome, SyncError> {
        if !self.is_relevant(event) {
            return Ok(PatchOutcome::Ignored);
        }

        let _gate = self.state.lock_key(self.key).await;
        if !self.state.contains(self.key) {
            return Ok(PatchOutcome::Ignored);
        }

        let outcome = match event {
            FileEvent::Renamed { from, to } => self.patch_graph(|graph| {
                graph.rename_path(from.as_str(), to.as_str()) > 0
            }),
            FileEvent::Deleted { path } => self.patch_graph(|graph| {
                !graph.remove_nodes_with_path(path.as_str()).is_empty()
            }),
            FileEvent::Created { path } | FileEvent::Changed { path } => {
                self.rewalk(path.as_str()).await?
            }
        };

        if outcome == PatchOutcome::Applied {
            self.state.send_graph(self.key);
        }
        debug!(
            "event=graph_patch module=watcher status=ok key={} outcome={:?} event={:?}",
            self.key, outcome, event
        );
        Ok(outcome)
    }

    fn is_relevant(&self, event: &FileEvent) -> bool {
        event.paths().into_iter().any(|path| {
            self.config.accepts_path(path) && matches_kind_extension(self.key.kind, path)
        })
    }

    fn patch_graph(&self, patch: impl FnOnce(&mut Graph) -> bool) -> PatchOutcome {
        let changed = self.state.with_registry(|registry| {
            registry
                .get_mut(self.key)
                .map(|view| patch(&mut view.graph))
                .unwrap_or(false)
        });
        if changed {
            PatchOutcome::Applied
        } else {
            PatchOutcome::Unchanged
        }
    }

    /// Scoped re-walk of the document at `path` and merge into the live graph.
    async fn rewalk(&self, path: &str) -> Result<PatchOutcome, SyncError> {
        let Some(handle) = self.store.find_by_path(self.key.kind, path).await? else {
            debug!(
                "event=graph_patch module=watcher status=skip key={} path={} reason=unknown_document",
                self.key, path
            );
            return Ok(PatchOutcome::Ignored);
        };

        if !self.is_reachable(&handle).await? {
            debug!(
                "event=graph_patch module=watcher status=skip key={} path={} reason=unreachable",
                self.key, path
            );
            return Ok(self.patch_graph(|graph| !graph.remove_nodes_with_path(path).is_empty()));
        }

        let builder = GraphBuilder::for_store(self.key.kind, self.store.as_ref());
        let walk = builder.walk_subtree(self.store.as_ref(), &handle).await?;
        let parent_id = self
            .store
            .parent_of(&handle)
            .await?
            .map(|parent| node_id(&parent));
        let root_id = node_id(&handle);

        Ok(self.patch_graph(|graph| {
            merge_walk(graph, walk, path, root_id.as_str(), parent_id.as_deref())
        }))
    }

    /// Whether a full rebuild would reach `handle`: following parents ends at
    /// a listed root without crossing a stub.
    async fn is_reachable(&self, handle: &DocumentHandle) -> Result<bool, SyncError> {
        let roots: HashSet<String> = self
            .store
            .list_roots(self.key.kind)
            .await?
            .iter()
            .map(node_id)
            .collect();

        let mut visited = HashSet::new();
        let mut current = handle.clone();
        loop {
            let id = node_id(&current);
            if roots.contains(&id) {
                return Ok(true);
            }
            if !visited.insert(id) {
                return Ok(false);
            }
            match self.store.parent_of(&current).await? {
                Some(parent) if !is_stub_handle(&parent) => current = parent,
                _ => return Ok(false),
            }
        }
    }
}

/// Merges a subtree walk into `graph`; returns whether anything changed.
///
/// Walked nodes are upserted and their outgoing edges replaced; stubs and
/// nodes at `path` the walk no longer reaches are removed; the edge from the
/// parent is restored when the parent is live.
fn merge_walk(
    graph: &mut Graph,
    walk: Walk,
    path: &str,
    root_id: &str,
    parent_id: Option<&str>,
) -> bool {
    let previous_out = outgoing_edges(graph, &walk.expanded);
    let mut changed = false;

    for stub in &walk.stubs {
        changed |= graph.remove_node(stub);
    }

    let walked: HashSet<String> = walk.graph.nodes.iter().map(|node| node.id.clone()).collect();
    for stale in graph.node_ids_with_path(path) {
        if !walked.contains(&stale) {
            changed |= graph.remove_node(&stale);
        }
    }

    graph.remove_edges_from(&walk.expanded);
    for node in walk.graph.nodes {
        changed |= graph.upsert_node(node) != Upsert::Unchanged;
    }
    graph.edges.extend(walk.graph.edges);

    if let Some(parent_id) = parent_id {
        if walk.expanded.contains(root_id)
            && graph.contains_node(parent_id)
            && !graph.contains_edge(parent_id, root_id)
        {
            graph.edges.push(GraphEdge::new(parent_id, root_id));
            changed = true;
        }
    }

    graph.prune_dangling_edges();
    changed || outgoing_edges(graph, &walk.expanded) != previous_out
}

/// Sorted outgoing edges of `sources`.
fn outgoing_edges(graph: &Graph, sources: &HashSet<String>) -> Vec<GraphEdge> {
    let mut edges: Vec<GraphEdge> = graph
        .edges
        .iter()
        .filter(|edge| sources.contains(edge.source.as_str()))
        .cloned()
        .collect();
    edges.sort();
    edges
}

#[cfg(test)]
mod tests {
    use super::merge_walk;
    use crate::graph::builder::Walk;
    use crate::model::graph::{Graph, GraphEdge, GraphNode};

    fn node(id: &str, path: &str, label: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            path: path.to_string(),
            label: label.to_string(),
        }
    }

    fn live() -> Graph {
        Graph {
            nodes: vec![
                node("root.r", "/ws/root.md", "Root"),
                node("a.a", "/ws/a.md", "A"),
                node("b.b", "/ws/b.md", "B"),
            ],
            edges: vec![GraphEdge::new("root.r", "a.a"), GraphEdge::new("a.a", "b.b")],
        }
    }

    #[test]
    fn merge_relabels_and_replaces_outgoing_edges() {
        let mut graph = live();
        let mut walk = Walk::default();
        walk.graph.nodes.push(node("a.a", "/ws/a.md", "A renamed"));
        walk.expanded.insert("a.a".to_string());

        assert!(merge_walk(&mut graph, walk, "/ws/a.md", "a.a", Some("root.r")));

        assert_eq!(graph.node("a.a").map(|n| n.label.as_str()), Some("A renamed"));
        assert!(graph.contains_edge("root.r", "a.a"));
        assert!(!graph.contains_edge("a.a", "b.b"));
        assert!(graph.contains_node("b.b"));
    }

    #[test]
    fn merge_removes_note_that_became_stub() {
        let mut graph = live();
        let mut walk = Walk::default();
        walk.stubs.push("a.a".to_string());

        assert!(merge_walk(&mut graph, walk, "/ws/a.md", "a.a", Some("root.r")));

        assert!(!graph.contains_node("a.a"));
        assert!(graph.dangling_edges().is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn merge_links_new_node_to_live_parent() {
        let mut graph = live();
        let mut walk = Walk::default();
        walk.graph.nodes.push(node("c.c", "/ws/c.md", "C"));
        walk.expanded.insert("c.c".to_string());

        assert!(merge_walk(&mut graph, walk, "/ws/c.md", "c.c", Some("a.a")));

        assert!(graph.contains_node("c.c"));
        assert!(graph.contains_edge("a.a", "c.c"));
        assert_eq!(graph.nodes.len(), 4);
    }

    #[test]
    fn merge_of_identical_walk_reports_no_change() {
        let mut graph = live();
        let mut walk = Walk::default();
        walk.graph.nodes.push(node("a.a", "/ws/a.md", "A"));
        walk.graph.nodes.push(node("b.b", "/ws/b.md", "B"));
        walk.graph.edges.push(GraphEdge::new("a.a", "b.b"));
        walk.expanded.insert("a.a".to_string());
        walk.expanded.insert("b.b".to_string());

        assert!(!merge_walk(&mut graph, walk, "/ws/a.md", "a.a", Some("root.r")));
        assert_eq!(graph.node_set(), live().node_set());
        assert_eq!(graph.edge_set(), live().edge_set());
    }
}
