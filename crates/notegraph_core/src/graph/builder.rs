//! Worklist tree walk that projects documents onto a flat graph.
//!
//! # Responsibility
//! - Walk every root (and everything reachable from it) exactly once per id.
//! - Emit one node per titled handle and one edge per parent→child link.
//! - Prune edges whose endpoints never became nodes.
//!
//! # Invariants
//! - The worklist is local to one walk; caller-owned roots are never mutated.
//! - A visited set keyed by node id bounds the walk on cycles and shared
//!   sub-structure; revisits only refresh the label.
//! - Title-less notes are skipped entirely: no node, no expansion.
//! - Graphs returned by [`GraphBuilder::build`] have no dangling edges.

use crate::graph::identity::{identify, node_id};
use crate::model::document::{DocumentHandle, DocumentKind};
use crate::model::graph::{Graph, GraphEdge};
use crate::store::{DocumentStore, StoreError};
use log::{debug, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Result type used by graph construction.
pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The store exposes no structural root for this kind.
    NoRootFound(DocumentKind),
    /// Store query failed mid-walk.
    Store(StoreError),
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRootFound(kind) => write!(f, "no root found for {kind}s"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::NoRootFound(_) => None,
        }
    }
}

impl From<StoreError> for GraphError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Counters collected by one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes: usize,
    pub edges: usize,
    pub pruned_edges: usize,
    pub stubs: usize,
    pub revisits: usize,
}

/// Raw walk output before pruning.
#[derive(Debug, Clone, Default)]
pub struct Walk {
    /// Nodes and edges in discovery order; edges may dangle.
    pub graph: Graph,
    /// Ids that became nodes and had their children expanded.
    pub expanded: HashSet<String>,
    /// Ids of title-less stubs that were skipped.
    pub stubs: Vec<String>,
    pub stats: BuildStats,
}

/// Builds hierarchy graphs for one document kind.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    kind: DocumentKind,
    workspace_root: PathBuf,
}

impl GraphBuilder {
    pub fn new(kind: DocumentKind, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            workspace_root: workspace_root.into(),
        }
    }

    /// Creates a builder rooted at the store's workspace.
    pub fn for_store(kind: DocumentKind, store: &dyn DocumentStore) -> Self {
        Self::new(kind, store.workspace_root())
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn workspace_root(&self) -> &Path {
        self.workspace_root.as_path()
    }

    /// Lists the store's roots for this kind and builds from them.
    pub async fn build_from_store(&self, store: &dyn DocumentStore) -> GraphResult<Graph> {
        let roots = store.list_roots(self.kind).await?;
        self.build(store, &roots).await
    }

    /// Full rebuild from `roots`.
    ///
    /// # Errors
    /// - [`GraphError::NoRootFound`] when `roots` is empty.
    /// - [`GraphError::Store`] when resolving children fails.
    pub async fn build(
        &self,
        store: &dyn DocumentStore,
        roots: &[DocumentHandle],
    ) -> GraphResult<Graph> {
        if roots.is_empty() {
            return Err(GraphError::NoRootFound(self.kind));
        }

        let mut walk = self.walk(store, roots.to_vec()).await?;
        walk.stats.pruned_edges = walk.graph.prune_dangling_edges();
        walk.stats.edges = walk.graph.edges.len();

        info!(
            "event=graph_build module=graph status=ok kind={} roots={} nodes={} edges={} pruned={} stubs={}",
            self.kind,
            roots.len(),
            walk.stats.nodes,
            walk.stats.edges,
            walk.stats.pruned_edges,
            walk.stats.stubs
        );
        Ok(walk.graph)
    }

    /// Walks the subtree under `handle` without pruning.
    ///
    /// Used by incremental patches that merge the result into a live graph.
    pub async fn walk_subtree(
        &self,
        store: &dyn DocumentStore,
        handle: &DocumentHandle,
    ) -> GraphResult<Walk> {
        self.walk(store, vec![handle.clone()]).await
    }

    async fn walk(
        &self,
        store: &dyn DocumentStore,
        mut worklist: Vec<DocumentHandle>,
    ) -> GraphResult<Walk> {
        let root = self.workspace_root.as_path();
        let mut walk = Walk::default();
        let mut visited = HashSet::new();

        while let Some(handle) = worklist.pop() {
            let identity = identify(&handle, root);
            let stub = identity.is_stub(handle.kind());

            if !visited.insert(identity.id.clone()) {
                walk.stats.revisits += 1;
                if !stub {
                    if let Some(existing) = walk
                        .graph
                        .nodes
                        .iter_mut()
                        .find(|node| node.id == identity.id)
                    {
                        if existing.label != identity.label {
                            existing.label = identity.label;
                        }
                    }
                }
                continue;
            }

            if stub {
                debug!(
                    "event=graph_stub module=graph status=skip kind={} id={}",
                    self.kind, identity.id
                );
                walk.stubs.push(identity.id);
                continue;
            }

            let source = identity.id.clone();
            walk.graph.nodes.push(identity.into_node());
            for child in store.children_of(&handle).await? {
                walk.graph
                    .edges
                    .push(GraphEdge::new(source.clone(), node_id(&child)));
                worklist.push(child);
            }
            walk.expanded.insert(source);
        }

        walk.stats.nodes = walk.graph.nodes.len();
        walk.stats.edges = walk.graph.edges.len();
        walk.stats.stubs = walk.stubs.len();
        Ok(walk)
    }
}
