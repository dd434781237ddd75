//! View identity and lifecycle model.
//!
//! # Invariants
//! - A [`ViewKey`] is the pair `(kind, mode)`; at most one live [`View`] exists
//!   per key (enforced by `ViewRegistry`).
//! - A view keeps its [`ViewId`] for its whole life; recreation after disposal
//!   yields a new id.

use crate::model::document::DocumentKind;
use crate::model::graph::Graph;
use crate::surface::RenderSurface;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Stable identity of one live view instance.
pub type ViewId = Uuid;

/// Graph projection variant. Only the hierarchy projection exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Hierarchy,
}

impl ViewMode {
    pub const ALL: [ViewMode; 1] = [ViewMode::Hierarchy];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hierarchy => "hierarchy",
        }
    }
}

/// Registry key for one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewKey {
    pub kind: DocumentKind,
    pub mode: ViewMode,
}

impl ViewKey {
    pub const fn new(kind: DocumentKind, mode: ViewMode) -> Self {
        Self { kind, mode }
    }

    pub const fn hierarchy(kind: DocumentKind) -> Self {
        Self::new(kind, ViewMode::Hierarchy)
    }

    /// Every (kind, mode) pair known to the engine.
    pub fn all() -> Vec<ViewKey> {
        DocumentKind::ALL
            .iter()
            .flat_map(|kind| ViewMode::ALL.iter().map(move |mode| Self::new(*kind, *mode)))
            .collect()
    }
}

impl Display for ViewKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.mode.as_str())
    }
}

/// One live graph view bound to a rendering surface.
pub struct View {
    id: ViewId,
    key: ViewKey,
    surface: Arc<dyn RenderSurface>,
    /// Current graph; replaced on full rebuild, patched on file events.
    pub graph: Graph,
}

impl View {
    pub fn new(key: ViewKey, surface: Arc<dyn RenderSurface>) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            surface,
            graph: Graph::new(),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn key(&self) -> ViewKey {
        self.key
    }

    pub fn surface(&self) -> &Arc<dyn RenderSurface> {
        &self.surface
    }
}

impl Debug for View {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("nodes", &self.graph.nodes.len())
            .field("edges", &self.graph.edges.len())
            .finish()
    }
}
