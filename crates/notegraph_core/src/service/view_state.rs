//! Shared view table plus per-key rebuild gates.
//!
//! # Invariants
//! - The registry mutex is only held for synchronous table access, never
//!   across `.await`.
//! - One async gate per view key; every graph mutation for a key (rebuild,
//!   patch, disposal) runs while holding that key's gate.

use crate::model::graph::Graph;
use crate::model::view::{ViewId, ViewKey};
use crate::registry::view_registry::ViewRegistry;
use crate::surface::{OutboundMessage, RenderSurface};
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug)]
pub(crate) struct ViewState {
    registry: Mutex<ViewRegistry>,
    gates: Mutex<BTreeMap<ViewKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl ViewState {
    pub(crate) fn new() -> Self {
        let gates = ViewKey::all()
            .into_iter()
            .map(|key| (key, Arc::new(tokio::sync::Mutex::new(()))))
            .collect();
        Self {
            registry: Mutex::new(ViewRegistry::init()),
            gates: Mutex::new(gates),
        }
    }

    /// Waits until no other rebuild/patch for `key` is in flight.
    pub(crate) async fn lock_key(&self, key: ViewKey) -> OwnedMutexGuard<()> {
        let gate = {
            let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(gates.entry(key).or_default())
        };
        gate.lock_owned().await
    }

    pub(crate) fn with_registry<R>(&self, f: impl FnOnce(&mut ViewRegistry) -> R) -> R {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut registry)
    }

    pub(crate) fn contains(&self, key: ViewKey) -> bool {
        self.with_registry(|registry| registry.contains(key))
    }

    /// Surface of the live view for `key`, without copying its graph.
    pub(crate) fn surface(&self, key: ViewKey) -> Option<Arc<dyn RenderSurface>> {
        self.with_registry(|registry| registry.get(key).map(|view| Arc::clone(view.surface())))
    }

    /// Surface and graph snapshot of the live view for `key`.
    pub(crate) fn snapshot(&self, key: ViewKey) -> Option<(ViewId, Arc<dyn RenderSurface>, Graph)> {
        self.with_registry(|registry| {
            registry
                .get(key)
                .map(|view| (view.id(), Arc::clone(view.surface()), view.graph.clone()))
        })
    }

    /// Posts the current graph of `key` to its surface.
    pub(crate) fn send_graph(&self, key: ViewKey) -> bool {
        match self.snapshot(key) {
            Some((view_id, surface, graph)) => {
                let delivered = surface.post(&OutboundMessage::Refresh(graph));
                debug!(
                    "event=graph_sent module=service status={} key={} view={}",
                    if delivered { "ok" } else { "dropped" },
                    key,
                    view_id
                );
                delivered
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ViewState;
    use crate::model::document::DocumentKind;
    use crate::model::view::{View, ViewKey};
    use crate::surface::{OutboundMessage, RenderSurface};
    use std::sync::Arc;

    struct NullSurface;

    impl RenderSurface for NullSurface {
        fn set_content(&self, _html: String) {}

        fn post(&self, _message: &OutboundMessage) -> bool {
            true
        }

        fn asset_uri(&self, file_name: &str) -> String {
            file_name.to_string()
        }
    }

    #[test]
    fn lookups_track_registered_views() {
        let state = ViewState::new();
        let key = ViewKey::hierarchy(DocumentKind::Note);
        assert!(!state.contains(key));
        assert!(state.surface(key).is_none());

        let surface: Arc<dyn RenderSurface> = Arc::new(NullSurface);
        state.with_registry(|registry| registry.set(key, View::new(key, Arc::clone(&surface))));

        assert!(state.contains(key));
        let found = state.surface(key).expect("surface should be registered");
        assert!(Arc::ptr_eq(&found, &surface));
        assert!(!state.contains(ViewKey::hierarchy(DocumentKind::Schema)));

        state.with_registry(|registry| registry.clear(key));
        assert!(!state.contains(key));
    }
}
