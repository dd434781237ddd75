//! Single-instance view table keyed by `(kind, mode)`.
//!
//! # Responsibility
//! - Own the one live [`View`] per view key.
//! - Replace module-level singleton maps with an explicit instance created
//!   once at startup.
//!
//! # Invariants
//! - `init` creates an empty slot for every known key.
//! - At most one view per key; `set` on an occupied slot replaces it.
//! - No internal locking: callers serialize access per key.

use crate::model::view::{View, ViewKey};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Live view table.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    slots: BTreeMap<ViewKey, Option<View>>,
}

impl ViewRegistry {
    /// Creates a registry with an empty slot for every known key.
    pub fn init() -> Self {
        let slots = ViewKey::all().into_iter().map(|key| (key, None)).collect();
        Self { slots }
    }

    pub fn get(&self, key: ViewKey) -> Option<&View> {
        self.slots.get(&key).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, key: ViewKey) -> Option<&mut View> {
        self.slots.get_mut(&key).and_then(Option::as_mut)
    }

    pub fn contains(&self, key: ViewKey) -> bool {
        self.get(key).is_some()
    }

    /// Stores `view` under `key`, returning any view it displaced.
    pub fn set(&mut self, key: ViewKey, view: View) -> Option<View> {
        let previous = self.slots.insert(key, Some(view)).flatten();
        if let Some(previous) = previous.as_ref() {
            warn!(
                "event=view_replaced module=registry status=ok key={} previous_view={}",
                key,
                previous.id()
            );
        }
        previous
    }

    /// Empties the slot for `key`.
    pub fn clear(&mut self, key: ViewKey) -> Option<View> {
        let removed = self.slots.get_mut(&key).and_then(Option::take);
        if let Some(view) = removed.as_ref() {
            debug!(
                "event=view_cleared module=registry status=ok key={} view={}",
                key,
                view.id()
            );
        }
        removed
    }

    /// Keys that currently hold a live view.
    pub fn live_keys(&self) -> Vec<ViewKey> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.is_some())
            .map(|(key, _)| *key)
            .collect()
    }

    /// Number of live views.
    pub fn len(&self) -> usize {
        self.slots.values().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::ViewRegistry;
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

    fn view(kind: DocumentKind) -> View {
        View::new(ViewKey::hierarchy(kind), Arc::new(NullSurface))
    }

    #[test]
    fn init_starts_with_empty_slots() {
        let registry = ViewRegistry::init();
        assert!(registry.is_empty());
        for key in ViewKey::all() {
            assert!(registry.get(key).is_none());
        }
    }

    #[test]
    fn set_get_clear_roundtrip_per_key() {
        let mut registry = ViewRegistry::init();
        let notes = ViewKey::hierarchy(DocumentKind::Note);
        let schemas = ViewKey::hierarchy(DocumentKind::Schema);

        let note_view = view(DocumentKind::Note);
        let note_id = note_view.id();
        assert!(registry.set(notes, note_view).is_none());
        assert_eq!(registry.get(notes).map(|v| v.id()), Some(note_id));
        assert!(registry.get(schemas).is_none());
        assert_eq!(registry.live_keys(), vec![notes]);

        let cleared = registry.clear(notes).expect("view should be cleared");
        assert_eq!(cleared.id(), note_id);
        assert!(registry.clear(notes).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn set_replaces_existing_view() {
        let mut registry = ViewRegistry::init();
        let key = ViewKey::hierarchy(DocumentKind::Schema);
        let first = view(DocumentKind::Schema);
        let first_id = first.id();
        registry.set(key, first);
        let displaced = registry
            .set(key, view(DocumentKind::Schema))
            .expect("first view should be displaced");
        assert_eq!(displaced.id(), first_id);
        assert_eq!(registry.len(), 1);
    }
}
